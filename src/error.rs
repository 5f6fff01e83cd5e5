// SPDX-License-Identifier: MPL-2.0

//! Handling solver errors.

use thiserror::Error;
use version_sets::VersionSet;

use crate::package::Package;
use crate::version::SemanticVersion;

/// Errors that may occur while solving dependencies.
///
/// Failure reports are plain strings assembled from the conflict history;
/// no solver internals leak through this boundary.
#[derive(Error, Debug)]
pub enum SolveError {
    /// No version of a package can satisfy the active constraints.
    #[error("no version of {package} satisfies the requirements\n{report}")]
    NoVersions {
        /// The package that ran out of versions.
        package: Package,
        /// The derivation that led here.
        report: String,
    },

    /// The dependency constraints contradict each other and no backtrack
    /// can help.
    #[error("{report}")]
    Unsatisfiable {
        /// The derivation that led here.
        report: String,
    },

    /// A package depends on itself with a constraint that excludes the
    /// very version declaring the dependency.
    #[error("{package} {version} depends on itself with constraint {constraint}, which excludes {version}")]
    SelfDependency {
        /// The package with the impossible self-dependency.
        package: Package,
        /// The version declaring it.
        version: SemanticVersion,
        /// The declared constraint.
        constraint: VersionSet<SemanticVersion>,
    },

    /// The dependency oracle failed; its error is passed through unchanged.
    #[error("the dependency oracle failed")]
    Oracle(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}
