// SPDX-License-Identifier: MPL-2.0

//! The partial solution: the ordered log of package assignments made so
//! far, stamped with decision levels for backtracking.

use std::fmt::{self, Display};

use crate::package::Package;
use crate::term::Term;
use crate::type_aliases::{Map, SelectedDependencies};
use crate::version::SemanticVersion;

/// The epoch of an assignment. Level 0 holds the root's forced assignment
/// and everything propagated from it; level k is the k-th free decision.
#[derive(Debug, Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct DecisionLevel(pub u32);

impl DecisionLevel {
    /// The next level up.
    pub fn increment(self) -> Self {
        Self(self.0 + 1)
    }

    /// The level below, if there is one.
    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

/// One package pinned to one version at one decision level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// The assigned package.
    pub package: Package,
    /// The version it is pinned to.
    pub version: SemanticVersion,
    /// The epoch the assignment was made in.
    pub level: DecisionLevel,
}

impl Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} (level {})", self.package, self.version, self.level.0)
    }
}

/// All assignments made so far: an append-order log plus a collapsed
/// per-package view, and the current decision level.
///
/// At most one assignment per package is live at any time. Backtracking
/// truncates the log; derived assignments are not retained across a
/// backtrack and are re-derived by propagation instead.
#[derive(Debug, Clone, Default)]
pub struct PartialSolution {
    history: Vec<Assignment>,
    positions: Map<Package, usize>,
    decision_level: DecisionLevel,
}

impl PartialSolution {
    /// An empty solution at level 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current decision level.
    pub fn decision_level(&self) -> DecisionLevel {
        self.decision_level
    }

    /// Open the next decision epoch.
    pub fn increment_level(&mut self) {
        self.decision_level = self.decision_level.increment();
    }

    /// Record an assignment. Re-assigning a package at or below its prior
    /// level replaces the prior value; a level above the current one is a
    /// caller bug.
    pub fn assign(&mut self, package: Package, version: SemanticVersion, level: DecisionLevel) {
        debug_assert!(
            level <= self.decision_level,
            "assignment of {} at level {} is above the current level {}",
            package,
            level.0,
            self.decision_level.0,
        );
        match self.positions.get(&package) {
            Some(&index) => {
                debug_assert!(self.history[index].level >= level, "re-assignment of {} must not raise its level", package);
                self.history[index] = Assignment {
                    package,
                    version,
                    level,
                };
            }
            None => {
                self.positions.insert(package.clone(), self.history.len());
                self.history.push(Assignment {
                    package,
                    version,
                    level,
                });
            }
        }
    }

    /// The live assignment of a package, if any.
    pub fn get(&self, package: &Package) -> Option<&Assignment> {
        self.positions.get(package).map(|&i| &self.history[i])
    }

    /// The assigned version of a package, if any.
    pub fn version_of(&self, package: &Package) -> Option<&SemanticVersion> {
        self.get(package).map(|a| &a.version)
    }

    /// Whether a package currently has an assignment.
    pub fn is_assigned(&self, package: &Package) -> bool {
        self.positions.contains_key(package)
    }

    /// Whether the assignments make a term true: the package is assigned
    /// and its version is in the term's set iff the term is positive.
    pub fn satisfies(&self, term: &Term) -> bool {
        match self.get(term.package()) {
            Some(assignment) => term.accepts(&assignment.version),
            None => false,
        }
    }

    /// Whether the assignments make a term false. An unassigned package
    /// leaves the term open: neither satisfied nor violated.
    pub fn violates(&self, term: &Term) -> bool {
        match self.get(term.package()) {
            Some(assignment) => !term.accepts(&assignment.version),
            None => false,
        }
    }

    /// Drop every assignment newer than `level` and make it the current
    /// level. The per-package view is rebuilt from the surviving log.
    pub fn backtrack_to(&mut self, level: DecisionLevel) {
        self.history.retain(|a| a.level <= level);
        self.positions.clear();
        for (index, assignment) in self.history.iter().enumerate() {
            self.positions.insert(assignment.package.clone(), index);
        }
        self.decision_level = level;
    }

    /// Number of live assignments.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// The solution as a package → version map.
    pub fn extract_solution(&self) -> SelectedDependencies {
        self.history
            .iter()
            .map(|a| (a.package.clone(), a.version.clone()))
            .collect()
    }
}

impl Display for PartialSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}:", self.decision_level.0)?;
        for assignment in &self.history {
            write!(f, " {}", assignment)?;
        }
        Ok(())
    }
}

// TESTS #######################################################################
