//! Component store throughput.
//!
//! Measures dense iteration over a populated store and the cost of churn
//! (destroy + create + attach) that recycles entity slots.
//!
//! Run with: `cargo bench --bench store_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tessera_ecs::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

fn populated(count: usize) -> (EntityAllocator, ComponentStore<Velocity>, Vec<EntityId>) {
    let mut alloc = EntityAllocator::with_capacity(count);
    let mut store = ComponentStore::with_capacity(count);
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let e = alloc.create().unwrap();
        store.set(e, Velocity { dx: i as f32, dy: 1.0 });
        ids.push(e);
    }
    (alloc, store, ids)
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_iterate");
    for count in [1_000usize, 10_000, 100_000] {
        let (_alloc, store, _ids) = populated(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &store, |b, store| {
            b.iter(|| {
                let sum: f32 = store.iter().map(|(_, v)| v.dx + v.dy).sum();
                black_box(sum)
            })
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    c.bench_function("store_churn_10k", |b| {
        let (mut alloc, mut store, mut ids) = populated(10_000);
        b.iter(|| {
            for slot in ids.iter_mut().step_by(10) {
                destroy_entity(*slot, &mut alloc, &mut [&mut store]);
                let e = alloc.create().unwrap();
                store.set(e, Velocity { dx: 0.0, dy: 0.0 });
                *slot = e;
            }
            black_box(store.len())
        })
    });
}

criterion_group!(benches, bench_iterate, bench_churn);
criterion_main!(benches);
