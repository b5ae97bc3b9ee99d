use criterion::{black_box, criterion_group, criterion_main, Criterion};
use host_compat::{
    CompatRegistry, HostFn, InterfaceVersion, RegistryBuilder, VersionPredicate,
    MIDNIGHT_THRESHOLD,
};
use serde_json::json;

fn build_registry() -> CompatRegistry {
    let mut builder = RegistryBuilder::new();
    for i in 0..64 {
        let key = format!("Capability{}", i);
        builder.register_split(
            key.clone(),
            MIDNIGHT_THRESHOLD,
            HostFn::new(|_| vec![json!(0)]),
            HostFn::new(|_| vec![json!(1)]),
        );
        builder.register(
            key,
            VersionPredicate::exactly(InterfaceVersion::new(110_207)),
            HostFn::new(|_| vec![json!(2)]),
            0,
        );
    }
    builder.freeze()
}

fn bench_resolve(c: &mut Criterion) {
    let registry = build_registry();
    let versions = [110_207, 119_999, 120_000].map(InterfaceVersion::new);

    c.bench_function("resolve_split_capability", |b| {
        b.iter(|| {
            for v in versions {
                black_box(registry.resolve(black_box("Capability31"), v).ok());
            }
        })
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
