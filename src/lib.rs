// SPDX-License-Identifier: MPL-2.0

//! Solvent: conflict-driven dependency version solving.
//!
//! Version solving consists in efficiently finding a set of packages and
//! versions that satisfy all the constraints of a given project
//! dependencies. In addition, when that is not possible, we should try to
//! provide a clear explanation as to why that failed.
//!
//! # Model
//!
//! Packages are [Package] identities (a name plus a root flag), versions
//! are [SemanticVersion]s, and sets of versions are canonical
//! [VersionSet]s re-exported from the `version-sets` crate. Constraints are
//! clauses over package [Term]s; the solver runs unit propagation over
//! them, makes free decisions newest-version-first, and analyzes every
//! contradiction into a learned clause plus a non-chronological backtrack.
//!
//! # Basic example
//!
//! Say `root` depends on `menu` and `icons`, `menu` depends on `dropdown`,
//! `dropdown` depends on `icons`, and `icons` has no dependency:
//!
//! ```
//! use solvent::{resolve, OfflineOracle, Package, SemanticVersion, VersionSet};
//!
//! let mut oracle = OfflineOracle::new();
//! let root = Package::root("root");
//! let menu = Package::new("menu");
//! let dropdown = Package::new("dropdown");
//! let icons = Package::new("icons");
//! let one = SemanticVersion::new(1, 0, 0);
//!
//! oracle.add_dependencies(
//!     root.clone(),
//!     one.clone(),
//!     [
//!         (menu.clone(), VersionSet::full()),
//!         (icons.clone(), VersionSet::full()),
//!     ],
//! );
//! oracle.add_dependencies(menu, one.clone(), [(dropdown.clone(), VersionSet::full())]);
//! oracle.add_dependencies(dropdown, one.clone(), [(icons.clone(), VersionSet::full())]);
//! oracle.add_dependencies(icons, one.clone(), []);
//!
//! let solution = resolve(&oracle, root, one).unwrap();
//! assert_eq!(solution.len(), 4);
//! ```
//!
//! # The dependency oracle
//!
//! [OfflineOracle] is a basic in-memory implementation of the
//! [DependencyOracle] trait. Implementing the trait yourself takes three
//! methods: `versions`, `dependencies` and `exists`. Implementations backed
//! by something expensive can be wrapped in a [CachingOracle], which
//! memoizes every query by composition.
//!
//! # Scenarios and failure reporting
//!
//! Whole package universes can be described as JSON [scenario](crate::scenario)
//! files and resolved without code. On failure, [resolve] returns a
//! [SolveError] whose display is a derivation assembled from the conflict
//! history: the immediate cause plus the most recent conflicts and learned
//! clauses.

#![warn(missing_docs)]

pub mod constraint;
mod error;
mod oracle;
mod package;
pub mod scenario;
mod solver;
mod term;
mod type_aliases;
mod version;

pub use error::SolveError;
pub use oracle::{CachingOracle, Dependency, DependencyOracle, OfflineOracle};
pub use package::Package;
pub use solver::{resolve, resolve_with_stats, ResolutionStats};
pub use term::Term;
pub use type_aliases::{Map, SelectedDependencies, Set};
pub use version::{SemanticVersion, VersionParseError};
pub use version_sets::VersionSet;

mod internal;
