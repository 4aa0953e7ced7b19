//! Benchmarks for filling and inundation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use floodgrid_algorithms::hydrology::{priority_flood, PriorityFloodParams};
use floodgrid_algorithms::inundation::{
    connected_flood_fill, AnalysisParams, ConnectedFillParams, InundationMethod,
    MultiLevelAnalyzer,
};
use floodgrid_core::{Connectivity, GeoTransform, Grid};
use floodgrid_parallel::ProcessingMode;

/// Create a DEM with a basin shape: higher edges sloping toward the centre
fn create_basin_dem(size: usize) -> Grid {
    let center = size as f64 / 2.0;
    let mut data = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            let dx = col as f64 - center;
            let dy = row as f64 - center;
            let dist = (dx * dx + dy * dy).sqrt();
            // Bowl shape + small noise to create pits
            let noise = ((row * 7 + col * 13) % 17) as f64 * 0.01;
            data.push(dist + noise);
        }
    }
    Grid::from_vec(data, size, size, None, GeoTransform::new(0.0, size as f64, 1.0, -1.0))
        .unwrap()
}

fn bench_priority_flood(c: &mut Criterion) {
    let mut group = c.benchmark_group("hydrology/priority_flood");
    for size in [128, 256, 512, 1024] {
        let dem = create_basin_dem(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| priority_flood(black_box(&dem), PriorityFloodParams::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_connected_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("inundation/connected_fill");
    for size in [256, 512, 1024] {
        let dem = create_basin_dem(size);
        let params = ConnectedFillParams::new(vec![(size / 2, size / 2)], Connectivity::Eight);
        let level = size as f64 / 4.0;
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| connected_flood_fill(black_box(&dem), level, &params).unwrap())
        });
    }
    group.finish();
}

fn bench_multi_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("inundation/multi_level");
    let size = 512;
    let dem = create_basin_dem(size);
    let levels: Vec<f64> = (1..=16).map(|i| i as f64 * 10.0).collect();

    for (name, mode) in [
        ("sequential", ProcessingMode::Sequential),
        ("parallel", ProcessingMode::Parallel),
    ] {
        let params = AnalysisParams {
            levels: levels.clone(),
            method: InundationMethod::FilledThreshold,
            mode,
        };
        let analyzer = MultiLevelAnalyzer::new(&dem);
        analyzer.filled().unwrap();
        group.bench_function(name, |b| b.iter(|| analyzer.run(black_box(&params)).unwrap()));
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_priority_flood,
    bench_connected_fill,
    bench_multi_level,
);
criterion_main!(benches);
