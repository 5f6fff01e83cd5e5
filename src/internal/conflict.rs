// SPDX-License-Identifier: MPL-2.0

//! Conflict analysis: turn a contradiction into a learned clause and a
//! backtrack target, and keep the bookkeeping that failure reports are
//! built from.

use std::fmt::Write;
use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;
use version_sets::VersionSet;

use crate::internal::incompatibility::Incompatibility;
use crate::internal::partial_solution::{DecisionLevel, PartialSolution};
use crate::internal::store::{IncompId, IncompatibilityStore};
use crate::package::Package;
use crate::term::Term;

type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// The outcome of analyzing one conflict.
#[derive(Debug)]
pub enum ConflictAnalysis {
    /// Jump back to `target`, optionally remembering a learned clause that
    /// forbids the assignment combination that produced the conflict.
    Backtrack {
        /// The clause to add to the store, if analysis produced one.
        learned: Option<Incompatibility>,
        /// The level to truncate the partial solution to.
        target: DecisionLevel,
    },
    /// No backtrack can help; resolution has failed.
    Unsolvable,
}

/// One entry of the conflict history.
#[derive(Debug, Clone)]
pub struct ConflictRecord {
    /// The clauses that participated in the conflict.
    pub contributing: Vec<IncompId>,
    /// The decision level the conflict occurred at.
    pub level: DecisionLevel,
    /// A diagnostic one-liner.
    pub summary: String,
}

/// Inspects the store and partial solution when a contradiction appears,
/// derives a learned clause and a backtrack level, and accumulates the
/// conflict history used for explanations and statistics.
#[derive(Debug, Default)]
pub struct ConflictAnalyzer {
    history: Vec<ConflictRecord>,
    learned: Vec<String>,
}

impl ConflictAnalyzer {
    /// A fresh analyzer with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a conflict on `conflicting`, the unit term that cannot be
    /// applied.
    ///
    /// Relevant clauses are those mentioning the conflicting package plus
    /// those currently almost satisfied. The learned clause negates every
    /// assignment participating at the highest decision level involved;
    /// the backtrack target is the second-highest distinct level, or one
    /// below the sole level, or unsolvable when nothing assigned
    /// participates.
    pub fn analyze(
        &mut self,
        conflicting: &Term,
        solution: &PartialSolution,
        store: &IncompatibilityStore,
    ) -> ConflictAnalysis {
        let relevant: Vec<IncompId> = store
            .iter()
            .filter(|(_, inc)| {
                inc.mentions(conflicting.package()) || inc.unit_term(solution).is_some()
            })
            .map(|(id, _)| id)
            .collect();
        if relevant.is_empty() {
            return ConflictAnalysis::Unsolvable;
        }

        // Assignments participating in the relevant clauses, in first-seen
        // order so repeated runs learn identical clauses.
        let mut participating: FxIndexMap<&Package, DecisionLevel> = FxIndexMap::default();
        for &id in &relevant {
            for term in store[id].terms() {
                if let Some(assignment) = solution.get(term.package()) {
                    participating.entry(term.package()).or_insert(assignment.level);
                }
            }
        }

        let level = solution.decision_level();
        self.history.push(ConflictRecord {
            contributing: relevant.clone(),
            level,
            summary: format!("conflict on {}", conflicting),
        });

        let Some(&highest) = participating.values().max() else {
            return ConflictAnalysis::Unsolvable;
        };

        let learned_terms: Vec<Term> = participating
            .iter()
            .filter(|(_, &l)| l == highest)
            .map(|(package, _)| {
                let version = solution
                    .version_of(package)
                    .expect("participating packages are assigned")
                    .clone();
                Term::negative((*package).clone(), VersionSet::singleton(version))
            })
            .collect();
        let learned = if learned_terms.is_empty() {
            None
        } else {
            Some(Incompatibility::derived(highest, relevant, learned_terms))
        };

        let mut levels: Vec<DecisionLevel> = participating.values().copied().collect();
        levels.sort_unstable();
        levels.dedup();
        let target = if levels.len() >= 2 {
            Some(levels[levels.len() - 2])
        } else {
            highest.previous()
        };

        match target {
            Some(target) => {
                if let Some(clause) = &learned {
                    self.learned.push(clause.to_string());
                }
                ConflictAnalysis::Backtrack { learned, target }
            }
            None => ConflictAnalysis::Unsolvable,
        }
    }

    /// Number of conflicts analyzed so far.
    pub fn conflict_count(&self) -> usize {
        self.history.len()
    }

    /// Number of learned clauses produced so far.
    pub fn learned_count(&self) -> usize {
        self.learned.len()
    }

    /// The failure report: the immediate cause followed by the most recent
    /// conflicts and learned clauses. A pure function of the bookkeeping.
    pub fn failure_report(&self, immediate_cause: &str) -> String {
        let mut out = format!("version solving failed: {}", immediate_cause);
        if !self.history.is_empty() {
            let _ = write!(out, "\nlast conflicts:");
            for record in self.history.iter().rev().take(3).rev() {
                let _ = write!(
                    out,
                    "\n  - {} at level {}, involving {} clauses",
                    record.summary,
                    record.level.0,
                    record.contributing.len()
                );
            }
        }
        if !self.learned.is_empty() {
            let _ = write!(out, "\nlast learned clauses:");
            for clause in self.learned.iter().rev().take(3).rev() {
                let _ = write!(out, "\n  - {}", clause);
            }
        }
        out
    }
}

// TESTS #######################################################################
