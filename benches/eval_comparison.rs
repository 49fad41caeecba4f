//! Benchmarks comparing sequential and parallel pipeline evaluation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rill::prelude::*;

fn sequential_sum(n: i32) -> i64 {
    Seq::range(0i32..n)
        .map(|x| x as i64)
        .reduce(0i64, |acc, x| acc + x, |a, b| a + b)
        .unwrap()
}

fn parallel_sum(n: i32) -> i64 {
    Seq::range(0i32..n)
        .parallel()
        .map(|x| x as i64)
        .reduce(0i64, |acc, x| acc + x, |a, b| a + b)
        .unwrap()
}

fn sequential_map_filter(n: i32) -> Vec<i32> {
    Seq::range(0i32..n)
        .filter(|x| x % 2 == 0)
        .map(|x| x * x)
        .collect(collectors::to_vec())
        .unwrap()
}

fn parallel_map_filter(n: i32) -> Vec<i32> {
    Seq::range(0i32..n)
        .parallel()
        .filter(|x| x % 2 == 0)
        .map(|x| x * x)
        .collect(collectors::to_vec())
        .unwrap()
}

fn make_strings(n: usize) -> Vec<String> {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| {
            (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(16)
                .map(char::from)
                .collect()
        })
        .collect()
}

fn sequential_sort_count(data: &[String]) -> usize {
    Seq::from_vec(data.to_vec()).sorted().count().unwrap()
}

fn parallel_sort_count(data: &[String]) -> usize {
    Seq::from_vec(data.to_vec()).parallel().sorted().count().unwrap()
}

fn bench_sum(c: &mut Criterion) {
    rill::init().ok();

    let mut group = c.benchmark_group("sum");

    for size in [1_000, 100_000, 1_000_000].iter() {
        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, &size| {
            b.iter(|| sequential_sum(black_box(size)))
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), size, |b, &size| {
            b.iter(|| parallel_sum(black_box(size)))
        });
    }

    group.finish();
}

fn bench_map_filter(c: &mut Criterion) {
    rill::init().ok();

    let mut group = c.benchmark_group("map_filter_collect");

    for size in [1_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, &size| {
            b.iter(|| sequential_map_filter(black_box(size)))
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), size, |b, &size| {
            b.iter(|| parallel_map_filter(black_box(size)))
        });
    }

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    rill::init().ok();

    let mut group = c.benchmark_group("sort_count");
    group.sample_size(20);

    for size in [10_000, 100_000].iter() {
        let data = make_strings(*size);

        group.bench_with_input(BenchmarkId::new("sequential", size), &data, |b, data| {
            b.iter(|| sequential_sort_count(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &data, |b, data| {
            b.iter(|| parallel_sort_count(black_box(data)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sum, bench_map_filter, bench_sort);
criterion_main!(benches);
