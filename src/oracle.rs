// SPDX-License-Identifier: MPL-2.0

//! The dependency oracle: the solver's only source of package knowledge.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::convert::Infallible;

use version_sets::VersionSet;

use crate::package::Package;
use crate::type_aliases::Map;
use crate::version::SemanticVersion;

/// One declared dependency: a package and the set of versions that would
/// satisfy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// The depended-upon package.
    pub package: Package,
    /// The versions of that package that satisfy the dependency.
    pub constraint: VersionSet<SemanticVersion>,
}

/// Read-only source of versions and dependencies per package.
///
/// This is the solver's sole collaborator. Calls must be pure with respect
/// to a single resolution: repeated calls with the same inputs return equal
/// results. Returned lists may be in any order; the solver sorts them
/// itself.
pub trait DependencyOracle {
    /// The kind of error returned from the oracle's methods.
    /// Returning one terminates the resolution with that error.
    type Err: std::error::Error + Send + Sync + 'static;

    /// Every known version of a package. May be empty.
    fn versions(&self, package: &Package) -> Result<Vec<SemanticVersion>, Self::Err>;

    /// The dependencies declared by one package version. May be empty.
    fn dependencies(
        &self,
        package: &Package,
        version: &SemanticVersion,
    ) -> Result<Vec<Dependency>, Self::Err>;

    /// Whether the package is known at all.
    fn exists(&self, package: &Package) -> Result<bool, Self::Err>;
}

/// A basic in-memory implementation of [DependencyOracle], mostly useful
/// for tests and scenario files.
#[derive(Debug, Clone, Default)]
pub struct OfflineOracle {
    versions: Map<Package, BTreeSet<SemanticVersion>>,
    dependencies: Map<(Package, SemanticVersion), Vec<Dependency>>,
}

impl OfflineOracle {
    /// Creates an empty oracle knowing no packages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a version of a package, with no dependencies yet.
    pub fn add_version(&mut self, package: Package, version: SemanticVersion) {
        self.versions.entry(package).or_default().insert(version);
    }

    /// Register the dependencies of a package version, also registering the
    /// version itself. Dependencies accumulate across calls in declaration
    /// order.
    pub fn add_dependencies<I>(&mut self, package: Package, version: SemanticVersion, deps: I)
    where
        I: IntoIterator<Item = (Package, VersionSet<SemanticVersion>)>,
    {
        self.add_version(package.clone(), version.clone());
        self.dependencies
            .entry((package, version))
            .or_default()
            .extend(deps.into_iter().map(|(package, constraint)| Dependency {
                package,
                constraint,
            }));
    }
}

impl DependencyOracle for OfflineOracle {
    type Err = Infallible;

    fn versions(&self, package: &Package) -> Result<Vec<SemanticVersion>, Infallible> {
        Ok(self
            .versions
            .get(package)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn dependencies(
        &self,
        package: &Package,
        version: &SemanticVersion,
    ) -> Result<Vec<Dependency>, Infallible> {
        Ok(self
            .dependencies
            .get(&(package.clone(), version.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn exists(&self, package: &Package) -> Result<bool, Infallible> {
        Ok(self.versions.contains_key(package))
    }
}

/// A caching decorator over any oracle: every query is forwarded at most
/// once and memoized. Composition, not inheritance; the inner oracle stays
/// reachable only through the cache.
///
/// Useful when the inner oracle is expensive (e.g. backed by I/O) and the
/// solver's candidate filtering asks the same questions repeatedly.
#[derive(Debug)]
pub struct CachingOracle<O: DependencyOracle> {
    inner: O,
    versions: RefCell<Map<Package, Vec<SemanticVersion>>>,
    dependencies: RefCell<Map<(Package, SemanticVersion), Vec<Dependency>>>,
    existence: RefCell<Map<Package, bool>>,
}

impl<O: DependencyOracle> CachingOracle<O> {
    /// Wrap an oracle.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            versions: RefCell::default(),
            dependencies: RefCell::default(),
            existence: RefCell::default(),
        }
    }

    /// Drop everything memoized so far.
    pub fn clear(&self) {
        self.versions.borrow_mut().clear();
        self.dependencies.borrow_mut().clear();
        self.existence.borrow_mut().clear();
    }
}

impl<O: DependencyOracle> DependencyOracle for CachingOracle<O> {
    type Err = O::Err;

    fn versions(&self, package: &Package) -> Result<Vec<SemanticVersion>, Self::Err> {
        if let Some(hit) = self.versions.borrow().get(package) {
            return Ok(hit.clone());
        }
        let fetched = self.inner.versions(package)?;
        self.versions
            .borrow_mut()
            .insert(package.clone(), fetched.clone());
        Ok(fetched)
    }

    fn dependencies(
        &self,
        package: &Package,
        version: &SemanticVersion,
    ) -> Result<Vec<Dependency>, Self::Err> {
        let key = (package.clone(), version.clone());
        if let Some(hit) = self.dependencies.borrow().get(&key) {
            return Ok(hit.clone());
        }
        let fetched = self.inner.dependencies(package, version)?;
        self.dependencies.borrow_mut().insert(key, fetched.clone());
        Ok(fetched)
    }

    fn exists(&self, package: &Package) -> Result<bool, Self::Err> {
        if let Some(hit) = self.existence.borrow().get(package) {
            return Ok(*hit);
        }
        let fetched = self.inner.exists(package)?;
        self.existence.borrow_mut().insert(package.clone(), fetched);
        Ok(fetched)
    }
}

// TESTS #######################################################################

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn offline_oracle_sorts_versions() {
        let mut oracle = OfflineOracle::new();
        let p = Package::new("p");
        oracle.add_version(p.clone(), SemanticVersion::new(2, 0, 0));
        oracle.add_version(p.clone(), SemanticVersion::new(1, 0, 0));
        oracle.add_version(p.clone(), SemanticVersion::new(1, 5, 0));
        assert_eq!(
            oracle.versions(&p).unwrap(),
            vec![
                SemanticVersion::new(1, 0, 0),
                SemanticVersion::new(1, 5, 0),
                SemanticVersion::new(2, 0, 0),
            ]
        );
        assert!(oracle.exists(&p).unwrap());
        assert!(!oracle.exists(&Package::new("q")).unwrap());
    }

    #[test]
    fn unknown_pairs_have_no_dependencies() {
        let oracle = OfflineOracle::new();
        let deps = oracle
            .dependencies(&Package::new("p"), &SemanticVersion::new(1, 0, 0))
            .unwrap();
        assert!(deps.is_empty());
    }

    /// Counts queries on the way through to the wrapped oracle.
    struct Counting<'a> {
        inner: OfflineOracle,
        version_queries: &'a Cell<usize>,
    }

    impl DependencyOracle for Counting<'_> {
        type Err = Infallible;

        fn versions(&self, package: &Package) -> Result<Vec<SemanticVersion>, Infallible> {
            self.version_queries.set(self.version_queries.get() + 1);
            self.inner.versions(package)
        }

        fn dependencies(
            &self,
            package: &Package,
            version: &SemanticVersion,
        ) -> Result<Vec<Dependency>, Infallible> {
            self.inner.dependencies(package, version)
        }

        fn exists(&self, package: &Package) -> Result<bool, Infallible> {
            self.inner.exists(package)
        }
    }

    #[test]
    fn caching_oracle_queries_once() {
        let mut inner = OfflineOracle::new();
        let p = Package::new("p");
        inner.add_version(p.clone(), SemanticVersion::new(1, 0, 0));
        let count = Cell::new(0);
        let oracle = CachingOracle::new(Counting {
            inner,
            version_queries: &count,
        });

        for _ in 0..3 {
            assert_eq!(oracle.versions(&p).unwrap().len(), 1);
        }
        assert_eq!(count.get(), 1);

        oracle.clear();
        oracle.versions(&p).unwrap();
        assert_eq!(count.get(), 2);
    }
}
