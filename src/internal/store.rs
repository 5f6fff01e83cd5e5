// SPDX-License-Identifier: MPL-2.0

//! The append-only store of incompatibilities, with a per-package index
//! and unit-clause detection against a partial solution.

use std::fmt;
use std::hash::BuildHasherDefault;
use std::ops::Index;

use rustc_hash::FxHasher;

use crate::internal::incompatibility::Incompatibility;
use crate::internal::partial_solution::PartialSolution;
use crate::package::Package;
use crate::term::Term;
use crate::type_aliases::Map;

type FxIndexSet<V> = indexmap::IndexSet<V, BuildHasherDefault<FxHasher>>;

/// The index of an incompatibility in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IncompId(u32);

impl fmt::Display for IncompId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// All incompatibilities of one resolution.
///
/// Clauses are only ever appended; backtracking never removes them. The
/// per-package index answers "which clauses mention this package" without a
/// full scan, and the mention set remembers the order in which packages
/// first appeared, which fixes the decision order.
#[derive(Debug, Clone, Default)]
pub struct IncompatibilityStore {
    incompats: Vec<Incompatibility>,
    by_package: Map<Package, Vec<IncompId>>,
    mentioned: FxIndexSet<Package>,
}

impl IncompatibilityStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause, indexing its packages. Returns its id.
    pub fn add(&mut self, incompat: Incompatibility) -> IncompId {
        let id = IncompId(self.incompats.len() as u32);
        for term in incompat.terms() {
            self.by_package
                .entry(term.package().clone())
                .or_default()
                .push(id);
            self.mentioned.insert(term.package().clone());
        }
        self.incompats.push(incompat);
        id
    }

    /// Number of clauses in the store.
    pub fn len(&self) -> usize {
        self.incompats.len()
    }

    /// Iterate over all clauses with their ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (IncompId, &Incompatibility)> {
        self.incompats
            .iter()
            .enumerate()
            .map(|(i, inc)| (IncompId(i as u32), inc))
    }

    /// Ids of the clauses mentioning a package.
    pub fn for_package(&self, package: &Package) -> &[IncompId] {
        self.by_package
            .get(package)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Packages mentioned by any clause, in first-mention order.
    pub fn mentioned(&self) -> impl Iterator<Item = &Package> {
        self.mentioned.iter()
    }

    /// The first zero-term clause, if any: resolution must fail.
    pub fn failure_clause(&self) -> Option<&Incompatibility> {
        self.incompats.iter().find(|inc| inc.is_failure())
    }

    /// The first clause all of whose terms are violated, if any.
    ///
    /// Returned with a clone of its last term so the conflict analyzer has
    /// a package to anchor on. Linear in the store size, like the unit
    /// scan below.
    pub fn violated_clause(&self, solution: &PartialSolution) -> Option<(IncompId, Term)> {
        self.iter()
            .find(|(_, inc)| inc.is_violated_by(solution))
            .and_then(|(id, inc)| inc.terms().last().map(|t| (id, t.clone())))
    }

    /// Every unit term currently forced by some clause, in clause order.
    ///
    /// This rescans the whole store on each call, O(clauses × terms); the
    /// store keeps no per-solution cache, so there is nothing to invalidate
    /// on backtrack.
    pub fn unit_clauses(&self, solution: &PartialSolution) -> Vec<(IncompId, Term)> {
        self.iter()
            .filter_map(|(id, inc)| inc.unit_term(solution).map(|t| (id, t.clone())))
            .collect()
    }
}

impl Index<IncompId> for IncompatibilityStore {
    type Output = Incompatibility;
    fn index(&self, id: IncompId) -> &Incompatibility {
        &self.incompats[id.0 as usize]
    }
}

// TESTS #######################################################################

#[cfg(test)]
mod tests {
    use version_sets::VersionSet;

    use super::*;
    use crate::internal::partial_solution::DecisionLevel;
    use crate::oracle::Dependency;
    use crate::version::SemanticVersion;

    fn v(s: &str) -> SemanticVersion {
        s.parse().unwrap()
    }

    fn store_with_chain() -> IncompatibilityStore {
        let mut store = IncompatibilityStore::new();
        store.add(Incompatibility::root(Package::root("root"), v("1.0.0")));
        store.add(Incompatibility::from_dependency(
            Package::root("root"),
            v("1.0.0"),
            &Dependency {
                package: Package::new("foo"),
                constraint: VersionSet::higher_than(v("1.0.0")),
            },
            0,
        ));
        store
    }

    #[test]
    fn index_and_mention_order() {
        let store = store_with_chain();
        assert_eq!(store.len(), 2);
        assert_eq!(store.for_package(&Package::root("root")).len(), 2);
        assert_eq!(store.for_package(&Package::new("foo")).len(), 1);
        assert_eq!(store.for_package(&Package::new("bar")).len(), 0);
        let order: Vec<_> = store.mentioned().map(|p| p.name().to_string()).collect();
        assert_eq!(order, ["root", "foo"]);
    }

    #[test]
    fn unit_scan_follows_assignments() {
        let store = store_with_chain();
        let mut solution = PartialSolution::new();
        // The root seed is unit for the unassigned root.
        let units = store.unit_clauses(&solution);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].1.package(), &Package::root("root"));

        solution.assign(Package::root("root"), v("1.0.0"), DecisionLevel(0));
        let units = store.unit_clauses(&solution);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].1.package(), &Package::new("foo"));

        solution.assign(Package::new("foo"), v("2.0.0"), DecisionLevel(0));
        assert!(store.unit_clauses(&solution).is_empty());
        assert!(store.violated_clause(&solution).is_none());
    }

    #[test]
    fn violated_clause_is_reported() {
        let store = store_with_chain();
        let mut solution = PartialSolution::new();
        solution.assign(Package::root("root"), v("1.0.0"), DecisionLevel(0));
        solution.assign(Package::new("foo"), v("1.0.0"), DecisionLevel(0));
        let (_, term) = store.violated_clause(&solution).expect("clause violated");
        assert_eq!(term.package(), &Package::new("foo"));
    }

    #[test]
    fn failure_clause_lookup() {
        let mut store = store_with_chain();
        assert!(store.failure_clause().is_none());
        store.add(Incompatibility::failure("impossible".into()));
        assert!(store.failure_clause().is_some());
    }
}
