// SPDX-License-Identifier: MPL-2.0

//! The scenario file format: a JSON description of a package universe that
//! can be resolved without any code.
//!
//! A scenario is a dictionary with two arrays:
//!
//! ```json
//! {
//!   "packages": [
//!     {"name": "root", "versions": ["1.0.0"]},
//!     {"name": "foo", "versions": ["1.0.0", "1.1.0"]}
//!   ],
//!   "dependencies": [
//!     {"package": "root", "version": "1.0.0", "dependency": "foo", "constraint": ">=1.0.0, <2.0.0"}
//!   ]
//! }
//! ```
//!
//! Constraints follow the grammar of [crate::constraint]. Every structural
//! or grammar error is reported before resolution starts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::{parse_constraint, ConstraintParseError};
use crate::oracle::OfflineOracle;
use crate::package::Package;
use crate::solver::resolve;
use crate::type_aliases::Map;
use crate::version::{SemanticVersion, VersionParseError};

/// A package universe: packages with their versions, and the dependencies
/// declared between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// The known packages and their version catalogs.
    pub packages: Vec<PackageEntry>,
    /// The declared dependencies.
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

/// One package and its cataloged versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageEntry {
    /// The package name.
    pub name: String,
    /// Its versions, as version strings.
    pub versions: Vec<String>,
}

/// One declared dependency edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEntry {
    /// The declaring package.
    pub package: String,
    /// The declaring version.
    pub version: String,
    /// The depended-upon package.
    pub dependency: String,
    /// The constraint, in the textual grammar.
    pub constraint: String,
}

/// Error loading a scenario. All of these surface before resolution starts.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// The input is not valid JSON for the scenario shape.
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),
    /// A version string failed to parse.
    #[error("package {package}: {source}")]
    Version {
        /// The package carrying the bad version.
        package: String,
        /// The underlying parse error.
        source: VersionParseError,
    },
    /// A constraint failed to parse.
    #[error("dependency of {package} {version} on {dependency}: {source}")]
    Constraint {
        /// The declaring package.
        package: String,
        /// The declaring version.
        version: String,
        /// The depended-upon package.
        dependency: String,
        /// The underlying parse error.
        source: ConstraintParseError,
    },
    /// A dependency references a package the scenario does not declare.
    #[error("dependency of {package} {version} references unknown package {dependency}")]
    UnknownPackage {
        /// The declaring package.
        package: String,
        /// The declaring version.
        version: String,
        /// The missing package.
        dependency: String,
    },
    /// A dependency is declared by a package the scenario does not declare.
    #[error("dependency declared by {package} {version}, but {package} is not a declared package")]
    UndeclaredPackage {
        /// The undeclared declaring package.
        package: String,
        /// The declaring version.
        version: String,
    },
}

/// The outcome of resolving a scenario, in the shape external tooling
/// consumes: a success flag, the solution map, or a failure derivation.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    /// Whether a complete assignment was found.
    pub success: bool,
    /// The package → version assignment on success.
    pub solution: Option<BTreeMap<String, String>>,
    /// The human-readable derivation on failure.
    pub error: Option<String>,
}

impl Scenario {
    /// Parse a scenario from its JSON form.
    pub fn from_json(input: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Build an oracle over this universe, with `root` flagged as the
    /// resolution root. Every version and constraint string is checked
    /// here, before any resolution.
    pub fn oracle(&self, root: &str) -> Result<OfflineOracle, ScenarioError> {
        let mut identities: Map<&str, Package> = Map::default();
        for entry in &self.packages {
            let package = if entry.name == root {
                Package::root(entry.name.clone())
            } else {
                Package::new(entry.name.clone())
            };
            identities.insert(entry.name.as_str(), package);
        }

        let mut oracle = OfflineOracle::new();
        for entry in &self.packages {
            let package = &identities[entry.name.as_str()];
            for version in &entry.versions {
                let version: SemanticVersion =
                    version.parse().map_err(|source| ScenarioError::Version {
                        package: entry.name.clone(),
                        source,
                    })?;
                oracle.add_version(package.clone(), version);
            }
        }
        for edge in &self.dependencies {
            let package = identities.get(edge.package.as_str()).ok_or_else(|| {
                ScenarioError::UndeclaredPackage {
                    package: edge.package.clone(),
                    version: edge.version.clone(),
                }
            })?;
            let dependency = identities.get(edge.dependency.as_str()).ok_or_else(|| {
                ScenarioError::UnknownPackage {
                    package: edge.package.clone(),
                    version: edge.version.clone(),
                    dependency: edge.dependency.clone(),
                }
            })?;
            let version: SemanticVersion =
                edge.version
                    .parse()
                    .map_err(|source| ScenarioError::Version {
                        package: edge.package.clone(),
                        source,
                    })?;
            let constraint = parse_constraint(&edge.constraint).map_err(|source| {
                ScenarioError::Constraint {
                    package: edge.package.clone(),
                    version: edge.version.clone(),
                    dependency: edge.dependency.clone(),
                    source,
                }
            })?;
            oracle.add_dependencies(package.clone(), version, [(dependency.clone(), constraint)]);
        }
        Ok(oracle)
    }

    /// Resolve the scenario from a root package and version. Input errors
    /// are reported through the same `{success, solution, error}` shape as
    /// resolution failures.
    pub fn resolve(&self, root: &str, version: &str) -> ResolutionReport {
        let oracle = match self.oracle(root) {
            Ok(oracle) => oracle,
            Err(error) => return ResolutionReport::failure(error.to_string()),
        };
        if !self.packages.iter().any(|p| p.name == root) {
            return ResolutionReport::failure(format!("root package {} is not declared", root));
        }
        let root_version: SemanticVersion = match version.parse() {
            Ok(v) => v,
            Err(error) => return ResolutionReport::failure(error.to_string()),
        };
        match resolve(&oracle, Package::root(root), root_version) {
            Ok(solution) => ResolutionReport {
                success: true,
                solution: Some(
                    solution
                        .into_iter()
                        .map(|(package, version)| {
                            (package.name().to_string(), version.to_string())
                        })
                        .collect(),
                ),
                error: None,
            },
            Err(error) => ResolutionReport::failure(error.to_string()),
        }
    }
}

impl ResolutionReport {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            solution: None,
            error: Some(error),
        }
    }
}

// TESTS #######################################################################
