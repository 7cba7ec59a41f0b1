//! Benchmarks for galaxy generation on the CPU.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use galaxy::{generate_with_rng, GalaxyParams};

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for count in [1_000u32, 20_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let params = GalaxyParams { count, ..Default::default() };
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| black_box(generate_with_rng(&params, &mut rng)))
        });
    }

    group.finish();
}

fn bench_vertices(c: &mut Criterion) {
    let params = GalaxyParams { count: 100_000, ..Default::default() };
    let cloud = generate_with_rng(&params, &mut StdRng::seed_from_u64(7));

    c.bench_function("interleave_100k", |b| b.iter(|| black_box(cloud.vertices())));
}

criterion_group!(benches, bench_generate, bench_vertices);
criterion_main!(benches);
