//! Inverse-search benchmarks: Brent (`A`) vs. Nelder-Mead (`Ab`) cost, and
//! the effect of the `AGrid` warm-start on Nelder-Mead iteration count.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use iad_core::config::{InverseConfig, SearchMode};
use iad_core::sample::{forward, ForwardOptions, Sample};
use iad_inverse::agrid::AGrid;
use iad_inverse::experiment::{invert, invert_with_grid, Experiment, SphereConfig};

fn truth_sample() -> Sample {
    Sample {
        a: 0.85,
        b: 3.0,
        g: 0.7,
        d: 1.0,
        n_sample: 1.4,
        n_above: 1.0,
        n_below: 1.0,
        nu0: 1.0,
        n_quad: 8,
    }
}

fn no_sphere() -> SphereConfig {
    SphereConfig { reflection: None, transmission: None, r_standard: 1.0, t_standard: 1.0 }
}

fn bench_a_only_search(c: &mut Criterion) {
    let truth = truth_sample();
    let target = forward(&truth, ForwardOptions::default()).unwrap();

    c.bench_function("invert_a_only", |b| {
        b.iter(|| {
            let mut guess = truth;
            guess.a = 0.3;
            let experiment = Experiment {
                sample: guess,
                spheres: no_sphere(),
                includes_direct_beam: true,
                m_r: Some(target.ur1),
                m_t: None,
                m_u: None,
            };
            let config = InverseConfig::default().with_search(SearchMode::A).with_tolerance(1e-5);
            black_box(invert(&experiment, config, ForwardOptions::default()).unwrap());
        });
    });
}

fn bench_ab_search_cold_vs_warm(c: &mut Criterion) {
    let truth = truth_sample();
    let target = forward(&truth, ForwardOptions::default()).unwrap();
    let grid = AGrid::build(32, 32, 1e-3, 1000.0, truth.g, truth.n_quad, truth.n_sample, truth.n_above, truth.n_below, truth.nu0).unwrap();

    let mut group = c.benchmark_group("invert_ab");
    group.bench_function("cold_start", |b| {
        b.iter(|| {
            let mut guess = truth;
            guess.a = 0.3;
            guess.b = 10.0;
            let experiment = Experiment {
                sample: guess,
                spheres: no_sphere(),
                includes_direct_beam: true,
                m_r: Some(target.ur1),
                m_t: Some(target.ut1),
                m_u: None,
            };
            let config = InverseConfig::default().with_search(SearchMode::Ab).with_tolerance(1e-5).without_warm_start();
            black_box(invert(&experiment, config, ForwardOptions::default()).unwrap());
        });
    });
    group.bench_function("grid_warm_start", |b| {
        b.iter(|| {
            let mut guess = truth;
            guess.a = 0.3;
            guess.b = 10.0;
            let experiment = Experiment {
                sample: guess,
                spheres: no_sphere(),
                includes_direct_beam: true,
                m_r: Some(target.ur1),
                m_t: Some(target.ut1),
                m_u: None,
            };
            let config = InverseConfig::default().with_search(SearchMode::Ab).with_tolerance(1e-5);
            black_box(invert_with_grid(&experiment, config, ForwardOptions::default(), Some(&grid)).unwrap());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_a_only_search, bench_ab_search_cold_vs_warm);
criterion_main!(benches);
