//! Benchmarks for polar clutter filling

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use scatterfill_algorithms::interpolation::{fill_masked_polar, IdwParams, Method};
use scatterfill_core::PolarField;

fn create_field(n_azimuths: usize, n_ranges: usize) -> PolarField<f32> {
    let data = Array2::from_shape_fn((n_azimuths, n_ranges), |(a, r)| {
        ((a as f32 * 0.05).sin() * 20.0 + r as f32 * 0.1).max(0.0)
    });
    // roughly 5% clutter in speckles plus a blocked sector
    let mask = Array2::from_shape_fn((n_azimuths, n_ranges), |(a, r)| {
        (a * 31 + r * 17) % 20 == 0 || (100..110).contains(&a)
    });
    PolarField::with_mask(data, mask).unwrap()
}

fn bench_polar_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("polar_fill");
    group.sample_size(10);

    for n_ranges in [128, 256, 512].iter() {
        let field = create_field(360, *n_ranges);

        group.bench_with_input(BenchmarkId::new("nearest", n_ranges), n_ranges, |b, _| {
            b.iter(|| fill_masked_polar(black_box(&field), &Method::default()).unwrap())
        });

        let idw = Method::InverseDistance(IdwParams::default());
        group.bench_with_input(BenchmarkId::new("idw", n_ranges), n_ranges, |b, _| {
            b.iter(|| fill_masked_polar(black_box(&field), &idw).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_polar_fill);
criterion_main!(benches);
