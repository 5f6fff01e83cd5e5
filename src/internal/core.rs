// SPDX-License-Identifier: MPL-2.0

//! The resolver state machine: unit propagation, decision making and
//! conflict-driven backtracking over one store and one partial solution.

use version_sets::VersionSet;

use crate::error::SolveError;
use crate::internal::conflict::{ConflictAnalysis, ConflictAnalyzer};
use crate::internal::incompatibility::Incompatibility;
use crate::internal::partial_solution::{DecisionLevel, PartialSolution};
use crate::internal::store::{IncompId, IncompatibilityStore};
use crate::oracle::DependencyOracle;
use crate::package::Package;
use crate::solver::ResolutionStats;
use crate::term::Term;
use crate::type_aliases::{SelectedDependencies, Set};
use crate::version::SemanticVersion;

/// What applying a unit term did.
enum Applied {
    /// An assignment was made or new clauses were recorded.
    Progress,
    /// Everything the term asks for was already in place.
    NoChange,
    /// No candidate version survived the term: a conflict.
    Conflict(Term),
}

/// Exclusively-owned state of one resolution. Dropped wholesale when the
/// resolution returns.
pub struct State<'o, O: DependencyOracle> {
    oracle: &'o O,
    root_package: Package,
    root_version: SemanticVersion,
    store: IncompatibilityStore,
    solution: PartialSolution,
    analyzer: ConflictAnalyzer,
    /// Pairs whose dependencies were already expanded into the store;
    /// a cycle therefore produces finite expansion.
    expanded: Set<(Package, SemanticVersion)>,
    /// Per-version exclusions already materialized from negative terms.
    excluded: Set<(Package, SemanticVersion)>,
}

impl<'o, O: DependencyOracle> State<'o, O> {
    /// Initialize the state for one resolution.
    pub fn new(oracle: &'o O, root_package: Package, root_version: SemanticVersion) -> Self {
        Self {
            oracle,
            root_package,
            root_version,
            store: IncompatibilityStore::new(),
            solution: PartialSolution::new(),
            analyzer: ConflictAnalyzer::new(),
            expanded: Set::default(),
            excluded: Set::default(),
        }
    }

    /// Run the resolution to completion.
    pub fn solve(mut self) -> Result<SelectedDependencies, SolveError> {
        let result = self.solve_inner();
        if let Err(error) = &result {
            log::info!("resolution failed: {}", error);
        }
        result
    }

    /// Run the resolution and report statistics either way.
    pub fn solve_with_stats(mut self) -> (Result<SelectedDependencies, SolveError>, ResolutionStats) {
        let result = self.solve_inner();
        let stats = ResolutionStats {
            conflicts: self.analyzer.conflict_count(),
            learned_clauses: self.analyzer.learned_count(),
            incompatibilities: self.store.len(),
            assignments: self.solution.len(),
            final_decision_level: self.solution.decision_level().0,
        };
        (result, stats)
    }

    fn solve_inner(&mut self) -> Result<SelectedDependencies, SolveError> {
        let root = self.root_package.clone();
        let version = self.root_version.clone();
        self.store
            .add(Incompatibility::root(root.clone(), version.clone()));
        self.solution.assign(root.clone(), version.clone(), DecisionLevel(0));
        self.expand(root, version)?;

        loop {
            self.propagate()?;
            let Some(package) = self.next_undecided() else {
                log::info!("solution complete: {}", self.solution);
                return Ok(self.solution.extract_solution());
            };
            self.decide(package)?;
        }
    }

    /// Unit propagation: repeatedly apply every forced term until a
    /// fixpoint. Contradictions are handed to the conflict analyzer, the
    /// solution is backtracked, and propagation restarts.
    fn propagate(&mut self) -> Result<(), SolveError> {
        'restart: loop {
            if let Some(clause) = self.store.failure_clause() {
                let report = self.analyzer.failure_report(&clause.cause());
                return Err(SolveError::Unsatisfiable { report });
            }
            if let Some((id, term)) = self.store.violated_clause(&self.solution) {
                log::info!("clause {} violated, starting conflict resolution", id);
                self.resolve_conflict(&term, false)?;
                continue 'restart;
            }
            let units = self.store.unit_clauses(&self.solution);
            if units.is_empty() {
                return Ok(());
            }
            let mut changed = false;
            for (id, term) in units {
                if self.solution.violates(&term) || self.contradicts_recorded(&term) {
                    log::info!("unit term {} conflicts, starting conflict resolution", term);
                    self.resolve_conflict(&term, false)?;
                    continue 'restart;
                }
                match self.apply_unit(id, term)? {
                    Applied::Progress => changed = true,
                    Applied::NoChange => {}
                    Applied::Conflict(term) => {
                        log::info!("no candidate for unit term {}", term);
                        self.resolve_conflict(&term, true)?;
                        continue 'restart;
                    }
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

    /// Hand a contradiction to the analyzer; backtrack or fail.
    fn resolve_conflict(&mut self, term: &Term, out_of_versions: bool) -> Result<(), SolveError> {
        match self.analyzer.analyze(term, &self.solution, &self.store) {
            ConflictAnalysis::Backtrack { learned, target } => {
                if let Some(clause) = learned {
                    log::info!("learned {}", clause);
                    self.store.add(clause);
                }
                log::info!("backtracking to level {}", target.0);
                self.solution.backtrack_to(target);
                Ok(())
            }
            ConflictAnalysis::Unsolvable => {
                let report = self.analyzer.failure_report(&format!("{} cannot hold", term));
                Err(if out_of_versions {
                    SolveError::NoVersions {
                        package: term.package().clone(),
                        report,
                    }
                } else {
                    SolveError::Unsatisfiable { report }
                })
            }
        }
    }

    /// Apply one forced term.
    ///
    /// A positive term picks a version for its package (newest first,
    /// steered by the lookahead) and expands its dependencies. A negative
    /// term materializes one exclusion clause per cataloged version in its
    /// set.
    fn apply_unit(&mut self, id: IncompId, term: Term) -> Result<Applied, SolveError> {
        if self.solution.is_assigned(term.package()) {
            // A sibling unit of the same pass already pinned the package;
            // contradiction was checked before applying.
            return Ok(Applied::NoChange);
        }
        if term.is_positive() {
            let package = term.package().clone();
            match self.choose_version(&package, term.versions())? {
                Some(version) => {
                    log::info!("derive {} {} (cause {})", package, version, id);
                    let level = self.solution.decision_level();
                    self.solution.assign(package.clone(), version.clone(), level);
                    self.expand(package, version)?;
                    Ok(Applied::Progress)
                }
                None => Ok(Applied::Conflict(term)),
            }
        } else {
            let package = term.package().clone();
            let mut progress = false;
            for version in self.catalog(&package)? {
                if term.versions().contains(&version)
                    && self.excluded.insert((package.clone(), version.clone()))
                {
                    self.store
                        .add(Incompatibility::excluded_version(package.clone(), version));
                    progress = true;
                }
            }
            Ok(if progress {
                Applied::Progress
            } else {
                Applied::NoChange
            })
        }
    }

    /// Record the dependency clauses of a newly assigned pair, once per
    /// distinct (package, version).
    fn expand(&mut self, package: Package, version: SemanticVersion) -> Result<(), SolveError> {
        if !self.expanded.insert((package.clone(), version.clone())) {
            return Ok(());
        }
        let deps = self
            .oracle
            .dependencies(&package, &version)
            .map_err(|e| SolveError::Oracle(Box::new(e)))?;
        for (index, dep) in deps.iter().enumerate() {
            if dep.package == package {
                if dep.constraint.contains(&version) {
                    // A self-dependency its own version satisfies is
                    // vacuous; a clause could not even encode it.
                    log::debug!("{} {} trivially depends on itself", package, version);
                    continue;
                }
                let cause = format!(
                    "{} {} has an unsatisfiable dependency on itself: {}",
                    package, version, dep.constraint
                );
                self.store.add(Incompatibility::failure(cause));
                return Err(SolveError::SelfDependency {
                    package,
                    version,
                    constraint: dep.constraint.clone(),
                });
            }
            if !self
                .oracle
                .exists(&dep.package)
                .map_err(|e| SolveError::Oracle(Box::new(e)))?
            {
                log::debug!(
                    "{} {} depends on {}, which the oracle does not know",
                    package,
                    version,
                    dep.package
                );
            }
            self.store.add(Incompatibility::from_dependency(
                package.clone(),
                version.clone(),
                dep,
                index,
            ));
        }
        Ok(())
    }

    /// The first mentioned-but-unassigned package, in mention order.
    fn next_undecided(&self) -> Option<Package> {
        self.store
            .mentioned()
            .find(|p| !self.solution.is_assigned(p))
            .cloned()
    }

    /// Free decision: pick a version for a package nothing forces yet.
    fn decide(&mut self, package: Package) -> Result<(), SolveError> {
        log::info!("decide {}", package);
        match self.choose_version(&package, &VersionSet::full())? {
            Some(version) => {
                self.solution.increment_level();
                let level = self.solution.decision_level();
                log::info!("decision: {} {} at level {}", package, version, level.0);
                self.solution.assign(package.clone(), version.clone(), level);
                self.expand(package, version)
            }
            None => {
                // Recorded as a clause; propagation turns it into a
                // conflict and the analyzer takes it from there.
                self.store.add(Incompatibility::no_versions(package));
                Ok(())
            }
        }
    }

    /// The package's catalog, sorted ascending and deduplicated.
    fn catalog(&self, package: &Package) -> Result<Vec<SemanticVersion>, SolveError> {
        let mut versions = self
            .oracle
            .versions(package)
            .map_err(|e| SolveError::Oracle(Box::new(e)))?;
        versions.sort();
        versions.dedup();
        Ok(versions)
    }

    /// Choose a version for `package` from `allowed`: it must be cataloged,
    /// fit every recorded constraint, and preferably survive the lookahead.
    /// Candidates are tried newest first; if the lookahead rejects them
    /// all, the newest otherwise-viable one is taken anyway, so the
    /// lookahead can steer but never changes satisfiability.
    fn choose_version(
        &self,
        package: &Package,
        allowed: &VersionSet<SemanticVersion>,
    ) -> Result<Option<SemanticVersion>, SolveError> {
        let viable: Vec<SemanticVersion> = self
            .catalog(package)?
            .into_iter()
            .filter(|v| allowed.contains(v))
            .filter(|v| self.fits_recorded(package, v))
            .collect();
        if viable.is_empty() {
            return Ok(None);
        }
        for version in viable.iter().rev() {
            if !self.creates_forward_conflict(package, version)? {
                return Ok(Some(version.clone()));
            }
        }
        Ok(viable.last().cloned())
    }

    /// Whether a version respects every term recorded for its package:
    /// inside every positive set, outside every negative one.
    fn fits_recorded(&self, package: &Package, version: &SemanticVersion) -> bool {
        self.store.for_package(package).iter().all(|&id| {
            match self.store[id].term_for(package) {
                Some(term) => term.accepts(version),
                None => true,
            }
        })
    }

    /// Whether a forced term contradicts what is already recorded for its
    /// package: some recorded term it can never agree with.
    fn contradicts_recorded(&self, term: &Term) -> bool {
        self.store.for_package(term.package()).iter().any(|&id| {
            match self.store[id].term_for(term.package()) {
                Some(recorded) => term.intersection(recorded).is_contradiction(),
                None => false,
            }
        })
    }

    /// The lookahead: would taking (package, version) strand some other
    /// package?
    ///
    /// Forward: every dependency of the candidate must keep at least one
    /// viable choice (and an already-assigned dependency must be inside
    /// the declared range). Reverse: every other unassigned package with a
    /// positive recorded constraint must keep at least one viable version
    /// whose own dependencies accept the candidate.
    fn creates_forward_conflict(
        &self,
        package: &Package,
        version: &SemanticVersion,
    ) -> Result<bool, SolveError> {
        let deps = self
            .oracle
            .dependencies(package, version)
            .map_err(|e| SolveError::Oracle(Box::new(e)))?;
        for dep in &deps {
            if dep.package == *package {
                if !dep.constraint.contains(version) {
                    return Ok(true);
                }
                continue;
            }
            if let Some(assigned) = self.solution.version_of(&dep.package) {
                if !dep.constraint.contains(assigned) {
                    return Ok(true);
                }
                continue;
            }
            let open = self.catalog(&dep.package)?.into_iter().any(|w| {
                dep.constraint.contains(&w) && self.fits_recorded(&dep.package, &w)
            });
            if !open {
                return Ok(true);
            }
        }

        for other in self.store.mentioned() {
            if other == package || self.solution.is_assigned(other) {
                continue;
            }
            if !self.has_positive_constraint(other) {
                continue;
            }
            let viable: Vec<SemanticVersion> = self
                .catalog(other)?
                .into_iter()
                .filter(|w| self.fits_recorded(other, w))
                .collect();
            if viable.is_empty() {
                // Already stranded; not this candidate's doing.
                continue;
            }
            let mut any_accepts = false;
            for w in &viable {
                let other_deps = self
                    .oracle
                    .dependencies(other, w)
                    .map_err(|e| SolveError::Oracle(Box::new(e)))?;
                if other_deps
                    .iter()
                    .all(|d| d.package != *package || d.constraint.contains(version))
                {
                    any_accepts = true;
                    break;
                }
            }
            if !any_accepts {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether any recorded clause constrains the package positively.
    fn has_positive_constraint(&self, package: &Package) -> bool {
        self.store.for_package(package).iter().any(|&id| {
            self.store[id]
                .term_for(package)
                .map(Term::is_positive)
                .unwrap_or(false)
        })
    }
}
