//! # Rollback Benchmark
//!
//! Steady-state frame saving and multi-frame rollback. Once the ring is
//! warm, saving a frame must not allocate, so these numbers are pure copy
//! cost.
//!
//! Run with: `cargo bench --package rewind_core --bench rollback_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rewind_core::{DataSet, Packing, RewindableDataSet};

const FRAMES: usize = 120;

#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct Transform {
    position: [f32; 3],
    rotation: [f32; 4],
}

#[derive(Clone, Default)]
struct Tags {
    names: Vec<String>,
}

fn blittable(count: i32) -> RewindableDataSet<Transform> {
    let mut set = RewindableDataSet::new(DataSet::new(1024, Packing::Continuous), FRAMES);
    for id in 0..count {
        set.insert(id, Transform::default());
    }
    for _ in 0..FRAMES {
        set.save_frame();
    }
    set
}

fn bench_save_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_frame_blittable");

    for count in [1_000, 10_000, 100_000] {
        let mut set = blittable(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                set.save_frame();
                black_box(set.count())
            });
        });
    }

    group.finish();
}

fn bench_save_frame_managed(c: &mut Criterion) {
    let mut set = RewindableDataSet::new(DataSet::<Tags>::managed(1024, Packing::WithHoles), FRAMES);
    for id in 0..10_000 {
        set.insert(
            id,
            Tags {
                names: vec![format!("entity-{id}")],
            },
        );
    }
    for _ in 0..FRAMES {
        set.save_frame();
    }

    c.bench_function("save_frame_managed_10000", |b| {
        b.iter(|| {
            set.save_frame();
            black_box(set.count())
        });
    });
}

fn bench_rollback(c: &mut Criterion) {
    let mut group = c.benchmark_group("rollback_blittable_100000");

    for frames in [1, 10, 60] {
        let mut set = blittable(100_000);
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, &frames| {
            b.iter(|| {
                set.rollback(frames);
                for _ in 0..frames {
                    set.save_frame();
                }
                black_box(set.count())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_save_frame, bench_save_frame_managed, bench_rollback);
criterion_main!(benches);
