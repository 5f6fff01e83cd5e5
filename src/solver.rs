// SPDX-License-Identifier: MPL-2.0

//! The resolution entry points.
//!
//! [resolve] finds one version for every package reachable from the root
//! such that every declared dependency is satisfied, or fails with a
//! human-readable derivation of why no assignment exists.
//!
//! The algorithm is conflict-driven: constraints are clauses over package
//! terms, unit propagation applies every forced term, free decisions pick
//! the newest viable version of the first constrained package, and each
//! contradiction is analyzed into a learned clause plus a non-chronological
//! backtrack target.
//!
//! ```
//! use solvent::{resolve, OfflineOracle, Package, SemanticVersion, VersionSet};
//!
//! let mut oracle = OfflineOracle::new();
//! let root = Package::root("root");
//! let menu = Package::new("menu");
//! let icons = Package::new("icons");
//! oracle.add_dependencies(
//!     root.clone(),
//!     SemanticVersion::new(1, 0, 0),
//!     [
//!         (menu.clone(), VersionSet::full()),
//!         (icons.clone(), VersionSet::full()),
//!     ],
//! );
//! oracle.add_dependencies(
//!     menu,
//!     SemanticVersion::new(1, 0, 0),
//!     [(icons.clone(), VersionSet::full())],
//! );
//! oracle.add_dependencies(icons, SemanticVersion::new(1, 0, 0), []);
//!
//! let solution = resolve(&oracle, root, SemanticVersion::new(1, 0, 0)).unwrap();
//! assert_eq!(solution.len(), 3);
//! ```

use crate::error::SolveError;
use crate::internal::State;
use crate::oracle::DependencyOracle;
use crate::package::Package;
use crate::type_aliases::SelectedDependencies;
use crate::version::SemanticVersion;

/// Main function of the library. Finds a version for every package
/// reachable from the given root package and version, so that every
/// declared dependency is satisfied.
///
/// Deterministic: the same oracle state always yields the same result.
pub fn resolve<O: DependencyOracle>(
    oracle: &O,
    package: Package,
    version: SemanticVersion,
) -> Result<SelectedDependencies, SolveError> {
    State::new(oracle, package, version).solve()
}

/// Like [resolve], also reporting counters about the run.
pub fn resolve_with_stats<O: DependencyOracle>(
    oracle: &O,
    package: Package,
    version: SemanticVersion,
) -> (Result<SelectedDependencies, SolveError>, ResolutionStats) {
    State::new(oracle, package, version).solve_with_stats()
}

/// Counters describing one resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Conflicts analyzed.
    pub conflicts: usize,
    /// Clauses learned from those conflicts.
    pub learned_clauses: usize,
    /// Total clauses accumulated in the store.
    pub incompatibilities: usize,
    /// Live assignments when the run ended.
    pub assignments: usize,
    /// The decision level the run ended at.
    pub final_decision_level: u32,
}
