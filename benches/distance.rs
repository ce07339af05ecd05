//! Benchmarks for distance calculations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pqcodec::distance::{scalar::ScalarDistance, simd::SimdDistance};
use pqcodec::{create_distance_function, DistanceFunction};
use rand::prelude::*;

fn generate_random_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn benchmark_l2_distance(c: &mut Criterion) {
    let dimensions = vec![4, 16, 128, 768];
    let mut rng = StdRng::seed_from_u64(42);

    let mut group = c.benchmark_group("l2_distance");

    for dim in dimensions {
        let a = generate_random_vector(&mut rng, dim);
        let b = generate_random_vector(&mut rng, dim);
        let distance_fn = create_distance_function(dim);

        group.bench_with_input(BenchmarkId::new("dimension", dim), &dim, |bencher, _| {
            bencher.iter(|| distance_fn.distance(black_box(&a), black_box(&b)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_simd_vs_scalar(c: &mut Criterion) {
    let dim = 128;
    let mut rng = StdRng::seed_from_u64(7);
    let a = generate_random_vector(&mut rng, dim);
    let b = generate_random_vector(&mut rng, dim);

    let simd_dist = SimdDistance::new(dim);
    let scalar_dist = ScalarDistance::new(dim);

    let mut group = c.benchmark_group("simd_vs_scalar");

    group.bench_function("simd_l2_128d", |bencher| {
        bencher.iter(|| simd_dist.distance(black_box(&a), black_box(&b)).unwrap());
    });

    group.bench_function("scalar_l2_128d", |bencher| {
        bencher.iter(|| scalar_dist.distance(black_box(&a), black_box(&b)).unwrap());
    });

    group.finish();
}

criterion_group!(distance_benches, benchmark_l2_distance, benchmark_simd_vs_scalar);
criterion_main!(distance_benches);
