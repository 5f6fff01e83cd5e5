// SPDX-License-Identifier: MPL-2.0

//! Publicly exported type aliases.

use crate::package::Package;
use crate::version::SemanticVersion;

/// Map implementation used by the library.
pub type Map<K, V> = rustc_hash::FxHashMap<K, V>;

/// Set implementation used by the library.
pub type Set<V> = rustc_hash::FxHashSet<V>;

/// Concrete package versions picked during [resolve](crate::resolve):
/// one version for every package reachable from the root.
pub type SelectedDependencies = Map<Package, SemanticVersion>;
