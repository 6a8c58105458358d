//! Orrery benchmarks.
//!
//! - Kepler solve across the eccentricity range of the planets
//! - Trail precompute, the one expensive step of mounting
//! - One animation frame, advance plus render
//!
//! Run with: cargo bench --bench orrery_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orrery::animation::SceneState;
use orrery::config::OrreryConfig;
use orrery::orbit::solver::{barycentric_offset, solve_kepler, Projection};
use orrery::render::{CommandRenderer, Renderer, View};
use orrery::scene::builder::{precompute_trails, SceneBuilder};

fn bench_kepler_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("kepler");
    group.sample_size(100);
    group.confidence_level(0.95);

    for e in [0.0067, 0.0934, 0.2056] {
        group.bench_with_input(BenchmarkId::new("solve", e), &e, |b, &e| {
            b.iter(|| {
                let mut acc = 0.0;
                for i in 0..360 {
                    acc += solve_kepler(black_box(f64::from(i).to_radians()), e);
                }
                black_box(acc)
            });
        });
    }

    group.bench_function("barycentric_offset", |b| {
        b.iter(|| black_box(barycentric_offset(black_box(1859.0))));
    });

    group.finish();
}

fn bench_trail_precompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("trails");
    group.sample_size(20);
    let projection = Projection::from_config(&OrreryConfig::default().projection);

    for steps in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("precompute", steps), &steps, |b, &steps| {
            b.iter(|| black_box(precompute_trails(&projection, steps)));
        });
    }

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    group.sample_size(50);

    let config = OrreryConfig::builder()
        .trail_steps(5_000)
        .star_count(1_000)
        .texture_divisor(8)
        .build();
    let Ok(scene) = SceneBuilder::new(&config).build() else {
        return;
    };
    let mut state = SceneState::new(scene, &config, 1280, 720);
    let mut renderer = CommandRenderer::default();
    let mut year = 1900.0;

    group.bench_function("advance", |b| {
        b.iter(|| {
            year = if year > 2050.0 { 1600.0 } else { year + 0.5 };
            black_box(state.advance(1.0 / 60.0, year))
        });
    });

    group.bench_function("advance_and_render", |b| {
        b.iter(|| {
            let report = state.advance(1.0 / 60.0, 2024.0);
            let view = View {
                camera: state.camera(),
                target: state.controls().target,
                width: 1280,
                height: 720,
            };
            black_box((report, renderer.render(state.scene(), &view)))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_kepler_solve, bench_trail_precompute, bench_frame);
criterion_main!(benches);
