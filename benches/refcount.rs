//! Reference counting benchmarks
//!
//! Measures handle clone/drop, erasure through `Any`, and allocation.

use anyrt::{Any, Str};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_clone_drop(c: &mut Criterion) {
    let mut group = c.benchmark_group("refcount");
    let s = Str::from("benchmark");

    group.bench_function("str_clone_drop", |b| {
        b.iter(|| black_box(s.clone()));
    });

    let any = Any::from(s.clone());
    group.bench_function("any_clone_drop", |b| {
        b.iter(|| black_box(any.clone()));
    });

    group.bench_function("any_cast_str", |b| {
        b.iter(|| black_box(any.cast::<Str>()));
    });

    group.finish();
}

fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation");

    group.bench_function("str_short", |b| {
        b.iter(|| black_box(Str::from(black_box("key"))));
    });

    let long = "x".repeat(4096);
    group.bench_function("str_4k", |b| {
        b.iter(|| black_box(Str::from(black_box(long.as_str()))));
    });

    group.finish();
}

criterion_group!(benches, bench_clone_drop, bench_allocation);
criterion_main!(benches);
