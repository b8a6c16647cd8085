//! # Sparse Set Benchmark
//!
//! Assign / unassign / lookup throughput for both packing modes, with and
//! without a paged payload.
//!
//! Run with: `cargo bench --package rewind_core --bench sparse_set_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rewind_core::{DataSet, Packing, SparseSet};

const ID_COUNT: i32 = 100_000;

fn shuffled_ids() -> Vec<i32> {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut ids: Vec<i32> = (0..ID_COUNT).collect();
    for index in (1..ids.len()).rev() {
        ids.swap(index, rng.gen_range(0..=index));
    }
    ids
}

fn bench_assign(c: &mut Criterion) {
    let ids = shuffled_ids();
    let mut group = c.benchmark_group("sparse_set_assign");

    for packing in [Packing::Continuous, Packing::WithHoles] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{packing:?}")), &packing, |b, &packing| {
            b.iter(|| {
                let mut set = SparseSet::with_capacity(ID_COUNT as usize, packing);
                for &id in &ids {
                    set.assign(id);
                }
                black_box(set.count())
            });
        });
    }

    group.finish();
}

fn bench_assign_unassign_churn(c: &mut Criterion) {
    let ids = shuffled_ids();
    let mut group = c.benchmark_group("sparse_set_churn");

    for packing in [Packing::Continuous, Packing::WithHoles] {
        let mut set = SparseSet::with_capacity(ID_COUNT as usize, packing);
        for &id in &ids {
            set.assign(id);
        }

        group.bench_function(format!("{packing:?}"), |b| {
            b.iter(|| {
                for &id in &ids[..1_000] {
                    set.unassign(id);
                }
                for &id in &ids[..1_000] {
                    set.assign(id);
                }
                set.compact();
                black_box(set.count())
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let ids = shuffled_ids();
    let mut set = SparseSet::with_capacity(ID_COUNT as usize, Packing::Continuous);
    for &id in ids.iter().step_by(2) {
        set.assign(id);
    }

    c.bench_function("sparse_set_is_assigned", |b| {
        b.iter(|| ids.iter().filter(|&&id| set.is_assigned(black_box(id))).count());
    });
}

fn bench_data_set_insert(c: &mut Criterion) {
    let ids = shuffled_ids();

    c.bench_function("data_set_insert_u64", |b| {
        b.iter(|| {
            let mut set = DataSet::<u64>::new(1024, Packing::Continuous);
            for &id in &ids {
                set.insert(id, u64::from(id.unsigned_abs()));
            }
            black_box(set.count())
        });
    });
}

criterion_group!(
    benches,
    bench_assign,
    bench_assign_unassign_churn,
    bench_lookup,
    bench_data_set_insert,
);
criterion_main!(benches);
