// SPDX-License-Identifier: MPL-2.0

//! A term is the fundamental unit of reasoning of the solving algorithm.
//! It is a positive or negative expression about the versions of one package.

use std::fmt::{self, Display};

use version_sets::VersionSet;

use crate::package::Package;
use crate::version::SemanticVersion;

/// A positive or negative expression about the versions of one package.
///
/// A positive term means "some version from this set is chosen" for the
/// package; a negative term means "no version from this set may be chosen".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    package: Package,
    versions: VersionSet<SemanticVersion>,
    positive: bool,
}

/// Base methods.
impl Term {
    /// A positive term: some version from the set is chosen.
    pub fn positive(package: Package, versions: VersionSet<SemanticVersion>) -> Self {
        Self {
            package,
            versions,
            positive: true,
        }
    }

    /// A negative term: no version from the set may be chosen.
    pub fn negative(package: Package, versions: VersionSet<SemanticVersion>) -> Self {
        Self {
            package,
            versions,
            positive: false,
        }
    }

    /// A positive term containing exactly one version.
    pub(crate) fn exact(package: Package, version: SemanticVersion) -> Self {
        Self::positive(package, VersionSet::singleton(version))
    }

    /// A negative term excluding exactly one version.
    pub(crate) fn not_version(package: Package, version: SemanticVersion) -> Self {
        Self::negative(package, VersionSet::singleton(version))
    }

    /// The package this term talks about.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The version set of this term.
    pub fn versions(&self) -> &VersionSet<SemanticVersion> {
        &self.versions
    }

    /// Simply check if a term is positive.
    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// Negate a term. Evaluation of a negated term always returns the
    /// opposite of the evaluation of the original one.
    pub fn negate(&self) -> Self {
        Self {
            package: self.package.clone(),
            versions: self.versions.clone(),
            positive: !self.positive,
        }
    }

    /// Whether a chosen version makes this term true.
    pub(crate) fn accepts(&self, version: &SemanticVersion) -> bool {
        self.versions.contains(version) == self.positive
    }

    /// A term that can never be true: a positive term over the empty set,
    /// or a negative term over the full set.
    pub(crate) fn is_contradiction(&self) -> bool {
        if self.positive {
            self.versions.is_empty()
        } else {
            self.versions.is_full()
        }
    }
}

/// Set operations with terms. Everything is derived from the exact set
/// algebra; there is no fallback case analysis.
impl Term {
    /// Compute the intersection of two terms about the same package.
    /// If at least one term is positive, the intersection is also positive.
    pub fn intersection(&self, other: &Term) -> Term {
        debug_assert_eq!(self.package, other.package);
        match (self.positive, other.positive) {
            (true, true) => Self::positive(
                self.package.clone(),
                self.versions.intersection(&other.versions),
            ),
            (true, false) => Self::positive(
                self.package.clone(),
                self.versions.intersection(&other.versions.complement()),
            ),
            (false, true) => Self::positive(
                self.package.clone(),
                self.versions.complement().intersection(&other.versions),
            ),
            (false, false) => Self::negative(
                self.package.clone(),
                self.versions.union(&other.versions),
            ),
        }
    }

    /// Whether this term satisfies `other`: whenever `self` is true, `other`
    /// is true as well. Equivalent to `self ∩ ¬other` being impossible.
    pub fn satisfies(&self, other: &Term) -> bool {
        if self.package != other.package {
            return false;
        }
        self.intersection(&other.negate()).is_contradiction()
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{} {}", self.package, self.versions)
        } else {
            write!(f, "not {} {}", self.package, self.versions)
        }
    }
}

// TESTS #######################################################################

#[cfg(test)]
pub mod tests {
    use proptest::prelude::*;

    use super::*;

    fn set_strategy() -> impl Strategy<Value = VersionSet<SemanticVersion>> {
        prop::collection::vec(((0u32..5, 0u32..5, 0u32..5), (0u32..5, 0u32..5, 0u32..5)), 0..4)
            .prop_map(|pairs| {
                pairs
                    .into_iter()
                    .fold(VersionSet::empty(), |acc, (low, high)| {
                        acc.union(&VersionSet::between(low, high))
                    })
            })
    }

    pub fn strategy() -> impl Strategy<Value = Term> {
        (set_strategy(), any::<bool>()).prop_map(|(versions, positive)| Term {
            package: Package::new("p"),
            versions,
            positive,
        })
    }

    proptest! {

        #[test]
        fn negate_is_an_involution(term in strategy()) {
            assert_eq!(term.negate().negate(), term);
        }

        #[test]
        fn intersection_with_self_is_identity(term in strategy()) {
            if !term.is_contradiction() {
                assert_eq!(term.intersection(&term), term);
            }
        }

        #[test]
        fn non_contradictory_terms_satisfy_themselves(term in strategy()) {
            if !term.is_contradiction() {
                assert!(term.satisfies(&term));
            }
        }

        #[test]
        fn satisfies_means_empty_difference(t1 in strategy(), t2 in strategy()) {
            let difference = t1.intersection(&t2.negate());
            assert_eq!(t1.satisfies(&t2), difference.is_contradiction());
        }
    }

    #[test]
    fn negative_can_satisfy_positive() {
        // not (<1.0.0) implies >=1.0.0, which implies >=0.5.0.
        let below_one = VersionSet::strictly_lower_than(SemanticVersion::new(1, 0, 0));
        let above_half = VersionSet::higher_than(SemanticVersion::new(0, 5, 0));
        let negative = Term::negative(Package::new("p"), below_one);
        let positive = Term::positive(Package::new("p"), above_half);
        assert!(negative.satisfies(&positive));
        assert!(!positive.satisfies(&negative));
    }

    #[test]
    fn mixed_polarity_intersection_is_set_difference() {
        let p = Package::new("p");
        let broad = VersionSet::between(SemanticVersion::new(1, 0, 0), SemanticVersion::new(3, 0, 0));
        let cut = VersionSet::between(SemanticVersion::new(2, 0, 0), SemanticVersion::new(3, 0, 0));
        let t = Term::positive(p.clone(), broad).intersection(&Term::negative(p, cut));
        assert!(t.is_positive());
        assert_eq!(
            *t.versions(),
            VersionSet::between(SemanticVersion::new(1, 0, 0), SemanticVersion::new(2, 0, 0))
        );
    }
}
