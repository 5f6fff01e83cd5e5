// SPDX-License-Identifier: MPL-2.0

//! Canonical sets of versions for dependency solving.
//!
//! A [`VersionSet`] is a finite union of intervals over any ordered value
//! type, e.g. `(>=1, <2) OR (==3) OR (>4)`. Internally it is an ordered list
//! of segments with inclusive, exclusive or open ends, similar to a
//! `Vec<(Bound<V>, Bound<V>)>`.
//!
//! The list is always kept in **canonical form**: segments are sorted by
//! lower bound, pairwise disjoint, and never adjacent (two segments touching
//! at a point that either side includes are fused into one). Every
//! constructor and every operation funnels through one normalizer, so two
//! sets containing the same versions compare equal with plain `==`.
//!
//! Basic building blocks, combined with `union`, `intersection` and
//! `complement`:
//!  - [empty()](VersionSet::empty): no version
//!  - [full()](VersionSet::full): all versions
//!  - [singleton(v)](VersionSet::singleton): exactly the version v
//!  - [higher_than(v)](VersionSet::higher_than): `v <= versions`
//!  - [strictly_higher_than(v)](VersionSet::strictly_higher_than): `v < versions`
//!  - [lower_than(v)](VersionSet::lower_than): `versions <= v`
//!  - [strictly_lower_than(v)](VersionSet::strictly_lower_than): `versions < v`
//!  - [between(v1, v2)](VersionSet::between): `v1 <= versions < v2`
//!
//! The complement is exact, including across unbounded endpoints: it walks
//! the sorted segments and emits one segment per gap, with flipped
//! inclusivity at every finite boundary.
//!
//! ## Optional features
//!
//! * `serde`: serialization and deserialization of sets, given that the
//!   version type also supports it.
//! * `proptest`: exports a proptest strategy for `VersionSet<u32>`.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::ops::Bound::{self, Excluded, Included, Unbounded};
use std::ops::RangeBounds;

#[cfg(any(feature = "proptest", test))]
use proptest::prelude::*;
use smallvec::{smallvec, SmallVec};

/// A set of versions, stored as ordered, disjoint, non-adjacent segments.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VersionSet<V> {
    /// A single inline segment covers the common case of one plain range.
    segments: SmallVec<[Segment<V>; 1]>,
}

type Segment<V> = (Bound<V>, Bound<V>);

impl<V> VersionSet<V> {
    /// The set containing no version.
    pub fn empty() -> Self {
        Self {
            segments: SmallVec::new(),
        }
    }

    /// The set of all possible versions.
    pub fn full() -> Self {
        Self {
            segments: smallvec![(Unbounded, Unbounded)],
        }
    }

    /// All versions higher than or equal to some version.
    pub fn higher_than(v: impl Into<V>) -> Self {
        Self {
            segments: smallvec![(Included(v.into()), Unbounded)],
        }
    }

    /// All versions strictly higher than some version.
    pub fn strictly_higher_than(v: impl Into<V>) -> Self {
        Self {
            segments: smallvec![(Excluded(v.into()), Unbounded)],
        }
    }

    /// All versions lower than or equal to some version.
    pub fn lower_than(v: impl Into<V>) -> Self {
        Self {
            segments: smallvec![(Unbounded, Included(v.into()))],
        }
    }

    /// All versions strictly lower than some version.
    pub fn strictly_lower_than(v: impl Into<V>) -> Self {
        Self {
            segments: smallvec![(Unbounded, Excluded(v.into()))],
        }
    }

    /// Whether the set contains no version at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the set contains every version.
    pub fn is_full(&self) -> bool {
        matches!(self.segments.as_slice(), [(Unbounded, Unbounded)])
    }

    /// Iterate over the segments of the set, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&Bound<V>, &Bound<V>)> {
        self.segments.iter().map(|(start, end)| (start, end))
    }
}

impl<V: Clone> VersionSet<V> {
    /// The set containing exactly one version.
    pub fn singleton(v: impl Into<V>) -> Self {
        let v = v.into();
        Self {
            segments: smallvec![(Included(v.clone()), Included(v))],
        }
    }
}

impl<V: Ord> VersionSet<V> {
    /// Versions greater than or equal to `v1` but strictly less than `v2`.
    /// Empty if `v2 <= v1`.
    pub fn between(v1: impl Into<V>, v2: impl Into<V>) -> Self {
        let (start, end) = (Included(v1.into()), Excluded(v2.into()));
        if segment_is_valid(&start, &end) {
            Self {
                segments: smallvec![(start, end)],
            }
        } else {
            Self::empty()
        }
    }

    /// If the set contains exactly one version, return it.
    pub fn as_singleton(&self) -> Option<&V> {
        match self.segments.as_slice() {
            [(Included(v1), Included(v2))] if v1 == v2 => Some(v1),
            _ => None,
        }
    }

    /// Whether the set contains the given version.
    ///
    /// Linear in the number of segments, with an early exit once the sorted
    /// segments have passed the version.
    pub fn contains(&self, version: &V) -> bool {
        for (start, end) in &self.segments {
            let below = match start {
                Included(s) => version < s,
                Excluded(s) => version <= s,
                Unbounded => false,
            };
            if below {
                return false;
            }
            let inside = match end {
                Included(e) => version <= e,
                Excluded(e) => version < e,
                Unbounded => true,
            };
            if inside {
                return true;
            }
        }
        false
    }
}

impl<V: Ord + Clone> VersionSet<V> {
    /// Build a set with one segment from anything implementing
    /// [`RangeBounds`], like `v1..v2` or `..=v`.
    pub fn from_range_bounds<R, IV>(bounds: R) -> Self
    where
        R: RangeBounds<IV>,
        IV: Clone + Into<V>,
    {
        let start = match bounds.start_bound() {
            Included(v) => Included(v.clone().into()),
            Excluded(v) => Excluded(v.clone().into()),
            Unbounded => Unbounded,
        };
        let end = match bounds.end_bound() {
            Included(v) => Included(v.clone().into()),
            Excluded(v) => Excluded(v.clone().into()),
            Unbounded => Unbounded,
        };
        if segment_is_valid(&start, &end) {
            Self {
                segments: smallvec![(start, end)],
            }
        } else {
            Self::empty()
        }
    }

    /// The single normalizer every set-producing operation funnels through.
    ///
    /// Drops segments that can hold no version, sorts by lower bound, and
    /// fuses segments that overlap or touch at an included endpoint. The
    /// output is canonical by construction.
    fn normalized(segments: impl IntoIterator<Item = Segment<V>>) -> Self {
        let mut kept: Vec<Segment<V>> = segments
            .into_iter()
            .filter(|(start, end)| segment_is_valid(start, end))
            .collect();
        kept.sort_by(|a, b| cmp_lower(&a.0, &b.0));
        let mut out: SmallVec<[Segment<V>; 1]> = SmallVec::new();
        for segment in kept {
            match out.last_mut() {
                Some(previous) if !gap_between(&previous.1, &segment.0) => {
                    if cmp_upper(&previous.1, &segment.1) == Ordering::Less {
                        previous.1 = segment.1;
                    }
                }
                _ => out.push(segment),
            }
        }
        Self { segments: out }.checked()
    }

    fn checked(self) -> Self {
        if cfg!(debug_assertions) {
            for pair in self.segments.windows(2) {
                debug_assert!(gap_between(&pair[0].1, &pair[1].0));
            }
            for (start, end) in &self.segments {
                debug_assert!(segment_is_valid(start, end));
            }
        }
        self
    }

    /// The union of two sets.
    pub fn union(&self, other: &Self) -> Self {
        Self::normalized(
            self.segments
                .iter()
                .chain(other.segments.iter())
                .cloned(),
        )
    }

    /// The intersection of two sets.
    ///
    /// Computed as the pairwise product of segments; both inputs are small
    /// in practice, and the normalizer restores canonical form.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut pieces = Vec::new();
        for (a_start, a_end) in &self.segments {
            for (b_start, b_end) in &other.segments {
                let start = if cmp_lower(a_start, b_start) == Ordering::Less {
                    b_start.clone()
                } else {
                    a_start.clone()
                };
                let end = if cmp_upper(a_end, b_end) == Ordering::Greater {
                    b_end.clone()
                } else {
                    a_end.clone()
                };
                if segment_is_valid(&start, &end) {
                    pieces.push((start, end));
                }
            }
        }
        Self::normalized(pieces)
    }

    /// The exact complement: everything not contained in `self`.
    ///
    /// Walks the sorted segments and emits one segment per gap: before the
    /// first lower bound, between each upper bound and the next lower bound
    /// with inclusivity flipped on both endpoints, and after the last upper
    /// bound. The empty set complements to the full set and vice versa.
    pub fn complement(&self) -> Self {
        let mut out: SmallVec<[Segment<V>; 1]> = SmallVec::new();
        // Lower bound of the next gap; None once a segment reaches +infinity.
        let mut cursor: Option<Bound<V>> = Some(Unbounded);
        for (start, end) in &self.segments {
            let gap_start = cursor
                .take()
                .expect("canonical sets have no segment after an unbounded end");
            match start {
                Unbounded => {}
                Included(v) => {
                    let gap = (gap_start, Excluded(v.clone()));
                    if segment_is_valid(&gap.0, &gap.1) {
                        out.push(gap);
                    }
                }
                Excluded(v) => {
                    let gap = (gap_start, Included(v.clone()));
                    if segment_is_valid(&gap.0, &gap.1) {
                        out.push(gap);
                    }
                }
            }
            cursor = match end {
                Unbounded => None,
                Included(v) => Some(Excluded(v.clone())),
                Excluded(v) => Some(Included(v.clone())),
            };
        }
        if let Some(gap_start) = cursor {
            out.push((gap_start, Unbounded));
        }
        Self { segments: out }.checked()
    }

    /// Whether no version is contained in both `self` and `other`.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.intersection(other).is_empty()
    }

    /// Whether every version contained in `self` is also contained in
    /// `other`.
    pub fn subset_of(&self, other: &Self) -> bool {
        self.intersection(other) == *self
    }
}

/// Whether at least one version can sit between the two bounds.
fn segment_is_valid<V: Ord>(start: &Bound<V>, end: &Bound<V>) -> bool {
    match (start, end) {
        // A singleton segment is allowed.
        (Included(s), Included(e)) => s <= e,
        (Included(s), Excluded(e)) => s < e,
        (Excluded(s), Included(e)) => s < e,
        (Excluded(s), Excluded(e)) => s < e,
        (Unbounded, _) | (_, Unbounded) => true,
    }
}

/// Order two lower bounds. Unbounded starts earliest; at equal versions an
/// included bound starts before an excluded one.
fn cmp_lower<V: Ord>(a: &Bound<V>, b: &Bound<V>) -> Ordering {
    match (a, b) {
        (Unbounded, Unbounded) => Ordering::Equal,
        (Unbounded, _) => Ordering::Less,
        (_, Unbounded) => Ordering::Greater,
        (Included(l), Included(r)) | (Excluded(l), Excluded(r)) => l.cmp(r),
        (Included(l), Excluded(r)) => l.cmp(r).then(Ordering::Less),
        (Excluded(l), Included(r)) => l.cmp(r).then(Ordering::Greater),
    }
}

/// Order two upper bounds. Unbounded ends latest; at equal versions an
/// excluded bound ends before an included one.
fn cmp_upper<V: Ord>(a: &Bound<V>, b: &Bound<V>) -> Ordering {
    match (a, b) {
        (Unbounded, Unbounded) => Ordering::Equal,
        (Unbounded, _) => Ordering::Greater,
        (_, Unbounded) => Ordering::Less,
        (Included(l), Included(r)) | (Excluded(l), Excluded(r)) => l.cmp(r),
        (Included(l), Excluded(r)) => l.cmp(r).then(Ordering::Greater),
        (Excluded(l), Included(r)) => l.cmp(r).then(Ordering::Less),
    }
}

/// Whether an upper bound and the following lower bound leave room for a
/// version between them, i.e. the two segments may not be fused.
///
/// ```text
/// gap:        |----|           |----|
/// no gap:     |----|----|   or |--|‾|--|  (overlapping)
/// ```
///
/// Two bounds meeting at the same version leave a gap only when both
/// exclude it.
fn gap_between<V: Ord>(end: &Bound<V>, start: &Bound<V>) -> bool {
    match (end, start) {
        (Unbounded, _) | (_, Unbounded) => false,
        (Included(l), Included(r)) => l < r,
        (Included(l), Excluded(r)) => l < r,
        (Excluded(l), Included(r)) => l < r,
        (Excluded(l), Excluded(r)) => l <= r,
    }
}

// REPORT ######################################################################

impl<V: Display + Eq> Display for VersionSet<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            write!(f, "∅")?;
        } else {
            for (idx, segment) in self.segments.iter().enumerate() {
                if idx > 0 {
                    write!(f, " | ")?;
                }
                match segment {
                    (Unbounded, Unbounded) => write!(f, "*")?,
                    (Unbounded, Included(v)) => write!(f, "<={v}")?,
                    (Unbounded, Excluded(v)) => write!(f, "<{v}")?,
                    (Included(v), Unbounded) => write!(f, ">={v}")?,
                    (Included(v), Included(b)) => {
                        if v == b {
                            write!(f, "{v}")?
                        } else {
                            write!(f, ">={v}, <={b}")?
                        }
                    }
                    (Included(v), Excluded(b)) => write!(f, ">={v}, <{b}")?,
                    (Excluded(v), Unbounded) => write!(f, ">{v}")?,
                    (Excluded(v), Included(b)) => write!(f, ">{v}, <={b}")?,
                    (Excluded(v), Excluded(b)) => write!(f, ">{v}, <{b}")?,
                };
            }
        }
        Ok(())
    }
}

// PROPTEST ####################################################################

/// Generate arbitrary canonical sets by folding random segments through
/// `union`, occasionally complemented to cover unbounded endpoints.
#[cfg(any(feature = "proptest", test))]
pub fn proptest_strategy() -> impl Strategy<Value = VersionSet<u32>> {
    (
        prop::collection::vec((any::<u32>(), 0u32..40), 0..6),
        any::<bool>(),
    )
        .prop_map(|(pieces, complemented)| {
            let set = pieces
                .into_iter()
                .fold(VersionSet::empty(), |acc, (start, len)| {
                    let piece = if len == 0 {
                        VersionSet::singleton(start)
                    } else {
                        VersionSet::between(start, start.saturating_add(len))
                    };
                    acc.union(&piece)
                });
            if complemented {
                set.complement()
            } else {
                set
            }
        })
}

// TESTS #######################################################################

#[cfg(test)]
pub mod tests {
    use proptest::prelude::*;

    use super::*;

    fn version_strat() -> impl Strategy<Value = u32> {
        any::<u32>()
    }

    proptest! {

        // Testing complement ------------------------------

        #[test]
        fn double_complement_is_identity(set in proptest_strategy()) {
            assert_eq!(set.complement().complement(), set);
        }

        #[test]
        fn complement_contains_opposite(set in proptest_strategy(), version in version_strat()) {
            assert_ne!(set.contains(&version), set.complement().contains(&version));
        }

        #[test]
        fn intersection_with_complement_is_empty(set in proptest_strategy()) {
            assert_eq!(set.intersection(&set.complement()), VersionSet::empty());
        }

        #[test]
        fn union_with_complement_is_full(set in proptest_strategy()) {
            assert_eq!(set.union(&set.complement()), VersionSet::full());
        }

        // Testing intersection ----------------------------

        #[test]
        fn intersection_is_symmetric(r1 in proptest_strategy(), r2 in proptest_strategy()) {
            assert_eq!(r1.intersection(&r2), r2.intersection(&r1));
        }

        #[test]
        fn intersection_with_full_is_identity(set in proptest_strategy()) {
            assert_eq!(VersionSet::full().intersection(&set), set);
        }

        #[test]
        fn intersection_with_empty_is_empty(set in proptest_strategy()) {
            assert_eq!(VersionSet::empty().intersection(&set), VersionSet::empty());
        }

        #[test]
        fn intersection_is_idempotent(r1 in proptest_strategy(), r2 in proptest_strategy()) {
            assert_eq!(r1.intersection(&r2).intersection(&r2), r1.intersection(&r2));
        }

        #[test]
        fn intersection_is_associative(r1 in proptest_strategy(), r2 in proptest_strategy(), r3 in proptest_strategy()) {
            assert_eq!(r1.intersection(&r2).intersection(&r3), r1.intersection(&r2.intersection(&r3)));
        }

        #[test]
        fn intersection_contains_both(r1 in proptest_strategy(), r2 in proptest_strategy(), version in version_strat()) {
            assert_eq!(r1.intersection(&r2).contains(&version), r1.contains(&version) && r2.contains(&version));
        }

        // Testing union -----------------------------------

        #[test]
        fn union_is_symmetric(r1 in proptest_strategy(), r2 in proptest_strategy()) {
            assert_eq!(r1.union(&r2), r2.union(&r1));
        }

        #[test]
        fn union_contains_either(r1 in proptest_strategy(), r2 in proptest_strategy(), version in version_strat()) {
            assert_eq!(r1.union(&r2).contains(&version), r1.contains(&version) || r2.contains(&version));
        }

        #[test]
        fn union_through_complements(r1 in proptest_strategy(), r2 in proptest_strategy()) {
            let union_def = r1.complement().intersection(&r2.complement()).complement();
            assert_eq!(r1.union(&r2), union_def);
        }

        // Testing predicates ------------------------------

        #[test]
        fn is_disjoint_through_intersection(r1 in proptest_strategy(), r2 in proptest_strategy()) {
            let disjoint_def = r1.intersection(&r2) == VersionSet::empty();
            assert_eq!(r1.is_disjoint(&r2), disjoint_def);
        }

        #[test]
        fn subset_of_through_intersection(r1 in proptest_strategy(), r2 in proptest_strategy()) {
            let subset_def = r1.intersection(&r2) == r1;
            assert_eq!(r1.subset_of(&r2), subset_def);
        }

        // Testing contains --------------------------------

        #[test]
        fn always_contains_singleton(version in version_strat()) {
            assert!(VersionSet::singleton(version).contains(&version));
        }

        #[test]
        fn contains_through_intersection(set in proptest_strategy(), version in version_strat()) {
            let by_intersection = set.intersection(&VersionSet::singleton(version)) != VersionSet::empty();
            assert_eq!(set.contains(&version), by_intersection);
        }

        #[test]
        fn from_range_bounds_agrees(range in any::<(Bound<u32>, Bound<u32>)>(), version in version_strat()) {
            let set: VersionSet<u32> = VersionSet::from_range_bounds(range);
            assert_eq!(range.contains(&version), set.contains(&version));
        }
    }

    #[test]
    fn empty_complements_to_full() {
        assert_eq!(VersionSet::<u32>::empty().complement(), VersionSet::full());
        assert_eq!(VersionSet::<u32>::full().complement(), VersionSet::empty());
    }

    #[test]
    fn reversed_between_is_empty() {
        assert_eq!(VersionSet::between(4u32, 2u32), VersionSet::empty());
        assert_eq!(VersionSet::between(2u32, 2u32), VersionSet::empty());
    }

    #[test]
    fn touching_segments_fuse() {
        // [1, 3) ∪ [3, 5) fuses into [1, 5).
        let fused = VersionSet::between(1u32, 3u32).union(&VersionSet::between(3u32, 5u32));
        assert_eq!(fused, VersionSet::between(1u32, 5u32));
        // (_, 3) ∪ (3, _) leaves the point 3 out.
        let punctured = VersionSet::strictly_lower_than(3u32)
            .union(&VersionSet::strictly_higher_than(3u32));
        assert_eq!(punctured, VersionSet::singleton(3u32).complement());
        assert!(!punctured.contains(&3));
    }

    #[test]
    fn complement_flips_boundary_inclusivity() {
        // complement of [2, 5) is (_, 2) ∪ [5, _).
        let set = VersionSet::between(2u32, 5u32);
        let expected = VersionSet::strictly_lower_than(2u32).union(&VersionSet::higher_than(5u32));
        assert_eq!(set.complement(), expected);
    }

    #[test]
    fn singleton_roundtrip() {
        let set = VersionSet::singleton(7u32);
        assert_eq!(set.as_singleton(), Some(&7));
        assert!(set.complement().as_singleton().is_none());
    }

    #[test]
    fn display_smoke() {
        assert_eq!(VersionSet::<u32>::empty().to_string(), "∅");
        assert_eq!(VersionSet::<u32>::full().to_string(), "*");
        assert_eq!(VersionSet::between(1u32, 3u32).to_string(), ">=1, <3");
        assert_eq!(
            VersionSet::singleton(2u32)
                .union(&VersionSet::higher_than(5u32))
                .to_string(),
            "2 | >=5"
        );
    }
}
