//! # Contagion Filter Benchmarks
//!
//! | Operation | Expectation |
//! |-----------|-------------|
//! | Cuckoo build | linear in disclosed records |
//! | Bloom build | linear in disclosed records |
//! | Client lookup | constant per observation |
//! | Filter decode | linear in filter size |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ha_01_epoch_store::RecordSnapshot;
use ha_02_contagion_filter::{
    BloomBuilder, ContagionFilter, CuckooBuilder, FilterConfig, FilterKind, MembershipBuilder,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{ephid_for_seed, DisclosureRecord, Epoch, EphId, Seed, SEED_LENGTH};
use std::time::Duration;

fn snapshot(count: usize) -> RecordSnapshot {
    let mut rng = StdRng::seed_from_u64(42);
    let records = (0..count).map(|i| {
        let mut seed = [0u8; SEED_LENGTH];
        rng.fill(&mut seed);
        DisclosureRecord::new(Epoch(i as u32), Seed::new(seed))
    });
    RecordSnapshot::from_records(records.collect::<Vec<_>>(), 1)
}

fn builders() -> Vec<(FilterKind, Box<dyn MembershipBuilder>)> {
    let bloom = FilterConfig::default().with_kind(FilterKind::Bloom);
    vec![
        (FilterKind::Cuckoo, Box::new(CuckooBuilder::default())),
        (FilterKind::Bloom, Box::new(BloomBuilder::new(&bloom))),
    ]
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter-build");
    group.measurement_time(Duration::from_secs(10));

    for size in [1_000usize, 10_000, 100_000] {
        let snap = snapshot(size);
        group.throughput(Throughput::Elements(size as u64));
        for (kind, builder) in builders() {
            group.bench_with_input(BenchmarkId::new(kind.to_string(), size), &snap, |b, snap| {
                b.iter(|| black_box(builder.build(snap).unwrap()))
            });
        }
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter-lookup");
    let snap = snapshot(50_000);
    let disclosed: Vec<(Epoch, EphId)> = snap
        .iter()
        .take(1_000)
        .map(|r| (r.epoch, ephid_for_seed(&r.seed)))
        .collect();

    let mut rng = StdRng::seed_from_u64(7);
    let unrelated: Vec<(Epoch, EphId)> = (0..1_000)
        .map(|i| {
            let mut id = [0u8; 16];
            rng.fill(&mut id);
            (Epoch(i), EphId(id))
        })
        .collect();

    group.throughput(Throughput::Elements(1_000));
    for (kind, builder) in builders() {
        let filter = builder.build(&snap).unwrap();
        group.bench_function(BenchmarkId::new("hit", kind), |b| {
            b.iter(|| {
                disclosed
                    .iter()
                    .filter(|(epoch, id)| filter.contains_observation(*epoch, id))
                    .count()
            })
        });
        group.bench_function(BenchmarkId::new("miss", kind), |b| {
            b.iter(|| {
                unrelated
                    .iter()
                    .filter(|(epoch, id)| filter.contains_observation(*epoch, id))
                    .count()
            })
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter-decode");
    let snap = snapshot(100_000);

    for (kind, builder) in builders() {
        let bytes = builder.build(&snap).unwrap().encode().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_function(kind.to_string(), |b| {
            b.iter(|| black_box(ContagionFilter::decode(&bytes).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_lookup, bench_decode);
criterion_main!(benches);
