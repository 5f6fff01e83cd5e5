// SPDX-License-Identifier: MPL-2.0

//! An incompatibility is a clause over package terms: the disjunction of
//! its terms must hold in every acceptable solution.

use std::fmt::{self, Display};

use version_sets::VersionSet;

use crate::internal::partial_solution::{DecisionLevel, PartialSolution};
use crate::internal::store::IncompId;
use crate::oracle::Dependency;
use crate::package::Package;
use crate::term::Term;
use crate::version::SemanticVersion;

/// A clause stating that the disjunction of its terms cannot be false.
///
/// For example, the dependency "foo 1.0.0 needs bar >=2.0.0" becomes the
/// clause `not foo 1.0.0 ∨ bar >=2.0.0`: either foo 1.0.0 is not chosen, or
/// a matching bar is. No two terms reference the same package. A clause
/// with no terms at all is unsatisfiable and ends the resolution.
#[derive(Debug, Clone)]
pub struct Incompatibility {
    terms: Vec<Term>,
    kind: Kind,
}

/// The provenance of an incompatibility. Diagnostic output is a pure
/// function of this data plus the terms.
#[derive(Debug, Clone)]
pub enum Kind {
    /// The seed clause requiring the root package at its version.
    Root(Package, SemanticVersion),
    /// The package has no version satisfying the active constraints.
    NoVersions(Package),
    /// Declared by a package version: the `usize` is the index of the
    /// dependency in that version's declaration order.
    Dependency(Package, SemanticVersion, usize),
    /// A pairwise conflict, carrying its pre-formatted explanation.
    Conflict(String),
    /// Learned by conflict analysis at the given level, from the listed
    /// contributing clauses.
    Derived(DecisionLevel, Vec<IncompId>),
}

impl Incompatibility {
    /// The seed clause: the root package must be picked at its version.
    pub fn root(package: Package, version: SemanticVersion) -> Self {
        Self {
            terms: vec![Term::exact(package.clone(), version.clone())],
            kind: Kind::Root(package, version),
        }
    }

    /// Remember that no version of a package fits the active constraints.
    pub fn no_versions(package: Package) -> Self {
        Self {
            terms: vec![Term::positive(package.clone(), VersionSet::full())],
            kind: Kind::NoVersions(package),
        }
    }

    /// Build a clause from one declared dependency: either the declaring
    /// version is not chosen, or the dependency is satisfied.
    pub fn from_dependency(
        package: Package,
        version: SemanticVersion,
        dep: &Dependency,
        dep_index: usize,
    ) -> Self {
        debug_assert_ne!(dep.package, package);
        Self {
            terms: vec![
                Term::not_version(package.clone(), version.clone()),
                Term::positive(dep.package.clone(), dep.constraint.clone()),
            ],
            kind: Kind::Dependency(package, version, dep_index),
        }
    }

    /// Exclude one cataloged version of a package, with a pre-formatted
    /// reason.
    pub fn excluded_version(package: Package, version: SemanticVersion) -> Self {
        let cause = format!("version {} of {} is excluded by an active constraint", version, package);
        Self {
            terms: vec![Term::not_version(package, version)],
            kind: Kind::Conflict(cause),
        }
    }

    /// The zero-term clause: unsatisfiable, resolution must stop.
    pub fn failure(cause: String) -> Self {
        Self {
            terms: Vec::new(),
            kind: Kind::Conflict(cause),
        }
    }

    /// A clause learned by conflict analysis. Terms are the negations of
    /// the assignments that produced the conflict.
    pub fn derived(level: DecisionLevel, contributing: Vec<IncompId>, terms: Vec<Term>) -> Self {
        debug_assert!(distinct_packages(&terms));
        Self {
            terms,
            kind: Kind::Derived(level, contributing),
        }
    }

    /// Whether this is the unsatisfiable zero-term clause.
    pub fn is_failure(&self) -> bool {
        self.terms.is_empty()
    }

    /// The terms of the clause, in declaration order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// The term about a given package, if the clause has one.
    pub fn term_for(&self, package: &Package) -> Option<&Term> {
        self.terms.iter().find(|t| t.package() == package)
    }

    /// Whether the clause mentions a given package.
    pub fn mentions(&self, package: &Package) -> bool {
        self.term_for(package).is_some()
    }

    /// Every term is satisfied by the current assignments.
    #[cfg(test)]
    pub fn is_satisfied_by(&self, solution: &PartialSolution) -> bool {
        self.terms.iter().all(|t| solution.satisfies(t))
    }

    /// Every term is violated by the current assignments: the clause is a
    /// contradiction that must trigger conflict resolution.
    pub fn is_violated_by(&self, solution: &PartialSolution) -> bool {
        !self.terms.is_empty() && self.terms.iter().all(|t| solution.violates(t))
    }

    /// The unit term, if this clause currently forces one: exactly one term
    /// is open (its package unassigned), no term is satisfied, and every
    /// other term is violated. The open term must be made true to avoid a
    /// contradiction with this clause.
    pub fn unit_term(&self, solution: &PartialSolution) -> Option<&Term> {
        let mut open = None;
        for term in &self.terms {
            if solution.is_assigned(term.package()) {
                if solution.satisfies(term) {
                    return None;
                }
                // Violated: keeps the clause pointed at the open term.
            } else {
                if open.is_some() {
                    return None;
                }
                open = Some(term);
            }
        }
        open
    }
}

fn distinct_packages(terms: &[Term]) -> bool {
    terms
        .iter()
        .enumerate()
        .all(|(i, t)| terms[..i].iter().all(|u| u.package() != t.package()))
}

impl Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            write!(f, "⊥")?;
        } else {
            for (i, term) in self.terms.iter().enumerate() {
                if i > 0 {
                    write!(f, " ∨ ")?;
                }
                write!(f, "{}", term)?;
            }
        }
        write!(f, " (because {})", self.cause())
    }
}

impl Incompatibility {
    /// Human-readable provenance, derived from the kind and terms only.
    pub fn cause(&self) -> String {
        match &self.kind {
            Kind::Root(package, version) => {
                format!("we are resolving the dependencies of {} {}", package, version)
            }
            Kind::NoVersions(package) => {
                format!("no version of {} satisfies the active constraints", package)
            }
            Kind::Dependency(package, version, index) => match self.terms.get(1) {
                Some(dep) => format!("{} {} depends on {}", package, version, dep),
                None => format!("{} {} declares dependency #{}", package, version, index),
            },
            Kind::Conflict(text) => text.clone(),
            Kind::Derived(level, contributing) => format!(
                "learned from a conflict at level {} involving {} clauses",
                level.0,
                contributing.len()
            ),
        }
    }
}

// TESTS #######################################################################

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        s.parse().unwrap()
    }

    fn dep_clause(package: &str, version: &str, dep: &str, low: &str, high: &str) -> Incompatibility {
        Incompatibility::from_dependency(
            Package::new(package),
            v(version),
            &Dependency {
                package: Package::new(dep),
                constraint: VersionSet::between(v(low), v(high)),
            },
            0,
        )
    }

    #[test]
    fn dependency_clause_shape() {
        let clause = dep_clause("foo", "1.0.0", "bar", "1.0.0", "2.0.0");
        assert_eq!(clause.terms().len(), 2);
        assert!(!clause.terms()[0].is_positive());
        assert!(clause.terms()[1].is_positive());
        assert!(clause.mentions(&Package::new("foo")));
        assert!(clause.mentions(&Package::new("bar")));
        assert!(!clause.mentions(&Package::new("baz")));
    }

    #[test]
    fn unit_detection() {
        let clause = dep_clause("foo", "1.0.0", "bar", "1.0.0", "2.0.0");
        let mut solution = PartialSolution::new();

        // Nothing assigned: two open terms, not unit.
        assert!(clause.unit_term(&solution).is_none());

        // foo pinned at 1.0.0 violates `not foo 1.0.0`; bar is forced.
        solution.assign(Package::new("foo"), v("1.0.0"), DecisionLevel(0));
        let unit = clause.unit_term(&solution).expect("clause must be unit");
        assert_eq!(unit.package(), &Package::new("bar"));
        assert!(unit.is_positive());

        // A satisfying bar closes the clause.
        solution.assign(Package::new("bar"), v("1.5.0"), DecisionLevel(0));
        assert!(clause.unit_term(&solution).is_none());
        assert!(!clause.is_violated_by(&solution));
    }

    #[test]
    fn satisfied_and_violated() {
        let clause = dep_clause("foo", "1.0.0", "bar", "1.0.0", "2.0.0");
        let mut solution = PartialSolution::new();
        solution.assign(Package::new("foo"), v("2.0.0"), DecisionLevel(0));
        solution.assign(Package::new("bar"), v("1.0.0"), DecisionLevel(0));
        // `not foo 1.0.0` and `bar [1,2)` both hold.
        assert!(clause.is_satisfied_by(&solution));

        let mut bad = PartialSolution::new();
        bad.assign(Package::new("foo"), v("1.0.0"), DecisionLevel(0));
        bad.assign(Package::new("bar"), v("2.0.0"), DecisionLevel(0));
        assert!(clause.is_violated_by(&bad));
        assert!(clause.unit_term(&bad).is_none());
    }

    #[test]
    fn failure_clause() {
        let clause = Incompatibility::failure("broken".into());
        assert!(clause.is_failure());
        assert!(clause.to_string().starts_with('⊥'));
    }
}
