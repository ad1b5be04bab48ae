//! # Container Benchmark
//!
//! Push, churn and iteration costs of the arena-backed containers.
//!
//! Run with: `cargo bench --package arenakit_core --bench container_benchmark`

#![allow(missing_docs)]

use std::hint::black_box;

use arenakit_core::{Arena, ArenaFlags, Array, StableArray, Text};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const ARENA_BYTES: usize = 4 * 1024 * 1024;

/// Benchmark: pushing into an Array that grows in place.
fn bench_array_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_push");

    for count in [1_000usize, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut arena = Arena::new(ARENA_BYTES, ArenaFlags::NO_LOG);
            b.iter(|| {
                {
                    let mut values: Array<'_, u32> = Array::new(&arena);
                    for i in 0..count {
                        values.push(i as u32);
                    }
                    black_box(values.len());
                }
                arena.clear();
            });
        });
    }

    group.finish();
}

/// Benchmark: erase every other element and refill, then iterate.
fn bench_stable_churn(c: &mut Criterion) {
    c.bench_function("stable_array_churn_10k", |b| {
        let mut arena = Arena::new(ARENA_BYTES, ArenaFlags::NO_LOG);
        b.iter(|| {
            {
                let mut list: StableArray<'_, [f32; 4]> = StableArray::new(&arena);
                let ptrs: Vec<_> = (0..10_000).map(|i| list.push([i as f32; 4])).collect();
                for ptr in ptrs.iter().step_by(2) {
                    list.erase(*ptr);
                }
                for i in 0..5_000 {
                    let _ = list.push([i as f32; 4]);
                }
                black_box(list.iter().map(|v| v[0]).sum::<f32>());
            }
            arena.clear();
        });
    });
}

/// Benchmark: building a line of mixed text and numbers.
fn bench_text_append(c: &mut Criterion) {
    c.bench_function("text_append_numbers", |b| {
        let mut arena = Arena::new(ARENA_BYTES, ArenaFlags::NO_LOG);
        b.iter(|| {
            {
                let mut line = Text::new(&arena);
                for i in 0..256u32 {
                    line.append("v").append(i).append('=').append(i as f32 * 0.5).append(';');
                }
                black_box(line.len());
            }
            arena.clear();
        });
    });
}

criterion_group!(benches, bench_array_push, bench_stable_churn, bench_text_append);
criterion_main!(benches);
