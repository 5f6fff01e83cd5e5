// SPDX-License-Identifier: MPL-2.0

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use solvent::{resolve, OfflineOracle, Package, SemanticVersion, VersionSet};

/// A linear chain: p0 -> p1 -> ... -> pN, three versions each, every link
/// a caret constraint.
fn chain_registry(length: usize) -> (OfflineOracle, Package) {
    let mut oracle = OfflineOracle::new();
    let root = Package::root("p0");
    for index in 0..length {
        let package = if index == 0 {
            root.clone()
        } else {
            Package::new(format!("p{}", index))
        };
        for minor in 0..3u32 {
            let version = SemanticVersion::new(1, minor, 0);
            let deps = if index + 1 < length {
                vec![(
                    Package::new(format!("p{}", index + 1)),
                    VersionSet::between(SemanticVersion::new(1, 0, 0), SemanticVersion::new(2, 0, 0)),
                )]
            } else {
                Vec::new()
            };
            oracle.add_dependencies(package.clone(), version, deps);
        }
    }
    (oracle, root)
}

/// A two-level fanout where the newest versions of the middle layer all
/// collide on a shared package, so the solver has to steer around them.
fn fanout_registry(width: usize) -> (OfflineOracle, Package) {
    let mut oracle = OfflineOracle::new();
    let root = Package::root("root");
    let shared = Package::new("shared");
    let any = VersionSet::between(SemanticVersion::new(1, 0, 0), SemanticVersion::new(3, 0, 0));
    oracle.add_dependencies(
        root.clone(),
        SemanticVersion::new(1, 0, 0),
        (0..width).map(|i| (Package::new(format!("m{}", i)), any.clone())),
    );
    for i in 0..width {
        let package = Package::new(format!("m{}", i));
        // The newest version wants a shared 2.x that nothing else accepts.
        oracle.add_dependencies(
            package.clone(),
            SemanticVersion::new(2, 0, 0),
            [(
                shared.clone(),
                VersionSet::between(SemanticVersion::new(2, 0, 0), SemanticVersion::new(3, 0, 0)),
            )],
        );
        oracle.add_dependencies(
            package,
            SemanticVersion::new(1, 0, 0),
            [(
                shared.clone(),
                VersionSet::between(SemanticVersion::new(1, 0, 0), SemanticVersion::new(2, 0, 0)),
            )],
        );
    }
    oracle.add_version(shared, SemanticVersion::new(1, 0, 0));
    (oracle, root)
}

fn bench_resolution(c: &mut Criterion) {
    let (chain, chain_root) = chain_registry(30);
    c.bench_function("deep_chain", |b| {
        b.iter(|| {
            let solution = resolve(
                black_box(&chain),
                chain_root.clone(),
                SemanticVersion::new(1, 2, 0),
            )
            .unwrap();
            black_box(solution)
        })
    });

    let (fanout, fanout_root) = fanout_registry(12);
    c.bench_function("wide_fanout", |b| {
        b.iter(|| {
            let solution = resolve(
                black_box(&fanout),
                fanout_root.clone(),
                SemanticVersion::new(1, 0, 0),
            )
            .unwrap();
            black_box(solution)
        })
    });
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
