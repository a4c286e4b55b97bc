use std::time::Duration;

use beamtrace::{RenderSettings, demo, geometry::ScreenSize, render};
use criterion::{Criterion, criterion_group, criterion_main};

fn criterion_benchmark(c: &mut Criterion) {
    let demo = demo::build(ScreenSize::new(640, 480)).unwrap();
    let settings = RenderSettings::default();

    c.bench_function("render_demo", |b| {
        b.iter(|| render(&demo.scene, &demo.camera, &demo.materials, &settings, |_| {}).unwrap())
    });

    c.bench_function("refresh_demo", |b| {
        b.iter_batched(
            || demo.scene.clone(),
            |mut scene| scene.refresh(&demo.materials),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20).measurement_time(Duration::from_secs(30));
    targets = criterion_benchmark
}
criterion_main!(benches);
