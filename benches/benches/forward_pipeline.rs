//! Forward-pipeline benchmarks: quadrature + redistribution + doubling +
//! boundary cost across quadrature orders and optical thicknesses.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use iad_core::sample::{forward, Sample, ForwardOptions};

fn sample_at(n_quad: u32, b: f64) -> Sample {
    Sample {
        a: 0.9,
        b,
        g: 0.8,
        d: 1.0,
        n_sample: 1.4,
        n_above: 1.0,
        n_below: 1.0,
        nu0: 1.0,
        n_quad,
    }
}

fn bench_forward_by_quadrature(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_by_quadrature");
    for &n_quad in &[4u32, 8, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(n_quad), &n_quad, |b, &n_quad| {
            let sample = sample_at(n_quad, 5.0);
            b.iter(|| forward(black_box(&sample), ForwardOptions::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_forward_by_thickness(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_by_thickness");
    group.throughput(Throughput::Elements(1));
    for &b_value in &[0.5f64, 5.0, 50.0] {
        group.bench_with_input(BenchmarkId::from_parameter(b_value), &b_value, |bencher, &b_value| {
            let sample = sample_at(8, b_value);
            bencher.iter(|| forward(black_box(&sample), ForwardOptions::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_forward_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_batch");
    group.throughput(Throughput::Elements(100));
    group.bench_function("100_samples_sequential", |b| {
        let samples: Vec<Sample> = (0..100).map(|i| sample_at(8, 0.5 + i as f64 * 0.1)).collect();
        b.iter(|| {
            for sample in &samples {
                black_box(forward(sample, ForwardOptions::default()).unwrap());
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_forward_by_quadrature, bench_forward_by_thickness, bench_forward_batch);
criterion_main!(benches);
