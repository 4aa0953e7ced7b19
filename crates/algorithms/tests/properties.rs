//! Whole-pipeline properties on synthetic DEMs.
//!
//! The rolling surface below has interior pits, a block of missing data
//! and a missing cell on the top edge, so outlets come from both the grid
//! boundary and data holes.

use std::collections::VecDeque;

use approx::assert_relative_eq;
use floodgrid_algorithms::hydrology::{fill_depressions, priority_flood, PriorityFloodParams};
use floodgrid_algorithms::inundation::{
    connected_flood_fill, threshold_mask, AnalysisParams, ConnectedFillParams, InundationMethod,
    MultiLevelAnalyzer, SeedPolicy, Surface,
};
use floodgrid_core::{Connectivity, Error, GeoTransform, Grid, SeedRejection};
use floodgrid_parallel::ProcessingMode;

const SIZE: usize = 32;

fn synthetic_dem() -> Grid {
    let mut data = Vec::with_capacity(SIZE * SIZE);
    for row in 0..SIZE {
        for col in 0..SIZE {
            let x = col as f64 / SIZE as f64;
            let y = row as f64 / SIZE as f64;
            let hole = (10..13).contains(&row) && (4..7).contains(&col);
            let edge_gap = row == 0 && col == SIZE / 2;
            if hole || edge_gap {
                data.push(-9999.0);
            } else {
                let noise = ((row * 7 + col * 13) % 17) as f64 * 0.05;
                let pit = if (row, col) == (20, 24) { -6.0 } else { 0.0 };
                data.push(10.0 + 4.0 * (x * 9.0).sin() * (y * 7.0).cos() + 3.0 * x + noise + pit);
            }
        }
    }
    Grid::from_vec(
        data,
        SIZE,
        SIZE,
        Some(-9999.0),
        GeoTransform::new(500.0, 800.0, 2.0, -2.0),
    )
    .unwrap()
}

fn nested_bowl() -> Grid {
    Grid::from_rows(&[
        vec![5.0, 5.0, 5.0, 5.0, 5.0],
        vec![5.0, 1.0, 1.0, 1.0, 5.0],
        vec![5.0, 1.0, 0.0, 1.0, 5.0],
        vec![5.0, 1.0, 1.0, 1.0, 5.0],
        vec![5.0, 5.0, 5.0, 5.0, 5.0],
    ])
    .unwrap()
}

/// Lowest valid cell, used as a seed that floods at every tested level
fn lowest_cell(grid: &Grid) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_z = f64::INFINITY;
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if let Some(z) = grid.elevation(row, col) {
                if z < best_z {
                    best_z = z;
                    best = (row, col);
                }
            }
        }
    }
    best
}

fn levels_over(grid: &Grid, count: usize) -> Vec<f64> {
    let stats = grid.statistics();
    let step = (stats.max - stats.min) / (count - 1) as f64;
    (0..count).map(|i| stats.min + i as f64 * step).collect()
}

// ---------------------------------------------------------------------------
// Filling
// ---------------------------------------------------------------------------

#[test]
fn fill_never_lowers_and_keeps_missing() {
    let grid = synthetic_dem();
    let filled = fill_depressions(&grid).unwrap();
    assert!(filled.raised_cells() > 0, "synthetic surface should contain pits");

    for row in 0..SIZE {
        for col in 0..SIZE {
            match (grid.elevation(row, col), filled.grid().elevation(row, col)) {
                (Some(z), Some(f)) => assert!(f >= z, "cell ({}, {}) lowered", row, col),
                (None, None) => {}
                other => panic!("validity changed at ({}, {}): {:?}", row, col, other),
            }
        }
    }
}

#[test]
fn every_cell_drains_to_an_outlet() {
    let filled = fill_depressions(&synthetic_dem()).unwrap();
    let surface = filled.grid();

    // Walk uphill from the outlets; every valid cell must be reached
    let mut reached = vec![false; SIZE * SIZE];
    let mut queue = VecDeque::new();
    for row in 0..SIZE {
        for col in 0..SIZE {
            if surface.is_outlet_adjacent(row, col) {
                reached[row * SIZE + col] = true;
                queue.push_back((row, col));
            }
        }
    }
    while let Some((row, col)) = queue.pop_front() {
        let z = surface.elevation(row, col).unwrap();
        for (nr, nc) in surface.neighbors(row, col, Connectivity::Four) {
            if reached[nr * SIZE + nc] {
                continue;
            }
            if surface.elevation(nr, nc).is_some_and(|nz| nz >= z) {
                reached[nr * SIZE + nc] = true;
                queue.push_back((nr, nc));
            }
        }
    }

    for row in 0..SIZE {
        for col in 0..SIZE {
            if surface.is_valid(row, col) {
                assert!(reached[row * SIZE + col], "({}, {}) has no downhill path", row, col);
            }
        }
    }
}

#[test]
fn fill_is_idempotent() {
    let once = fill_depressions(&synthetic_dem()).unwrap();
    let twice = fill_depressions(once.grid()).unwrap();
    assert_eq!(twice.grid(), once.grid());
    assert_eq!(twice.raised_cells(), 0);
}

#[test]
fn epsilon_fill_sits_on_or_above_flat_fill() {
    let grid = synthetic_dem();
    let filled = priority_flood(&grid, PriorityFloodParams { epsilon: 1e-4 }).unwrap();
    let flat = fill_depressions(&grid).unwrap();
    for row in 0..SIZE {
        for col in 0..SIZE {
            if let (Some(e), Some(f)) =
                (filled.grid().elevation(row, col), flat.grid().elevation(row, col))
            {
                assert!(e >= f);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Inundation
// ---------------------------------------------------------------------------

fn methods(grid: &Grid) -> Vec<InundationMethod> {
    let seed = lowest_cell(grid);
    let mut connected = ConnectedFillParams::new(vec![seed], Connectivity::Eight);
    connected.seed_policy = SeedPolicy::Skip;
    let mut connected_filled = connected.clone();
    connected_filled.surface = Surface::Filled;

    vec![
        InundationMethod::SimpleThreshold,
        InundationMethod::FilledThreshold,
        InundationMethod::ConnectedFill(connected),
        InundationMethod::ConnectedFill(connected_filled),
    ]
}

#[test]
fn masks_grow_with_level() {
    let grid = synthetic_dem();
    let analyzer = MultiLevelAnalyzer::new(&grid);

    for method in methods(&grid) {
        let report = analyzer
            .run(&AnalysisParams {
                levels: levels_over(&grid, 12),
                method: method.clone(),
                mode: ProcessingMode::Sequential,
            })
            .unwrap();
        assert!(report.is_complete(), "{} had failures", method.name());

        for pair in report.results.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            assert!(lo.level < hi.level);
            assert!(lo.mask.is_subset_of(&hi.mask), "{} mask shrank", method.name());
            assert!(lo.metrics.area <= hi.metrics.area);
            assert!(lo.metrics.volume <= hi.metrics.volume);
            assert!(lo.metrics.max_depth <= hi.metrics.max_depth);
        }
    }
}

#[test]
fn connected_mask_within_threshold_mask() {
    let grid = synthetic_dem();
    let filled = fill_depressions(&grid).unwrap();
    let seed = lowest_cell(&grid);

    for level in levels_over(&grid, 8) {
        for connectivity in [Connectivity::Four, Connectivity::Eight] {
            let mut params = ConnectedFillParams::new(vec![seed], connectivity);
            params.seed_policy = SeedPolicy::Skip;

            let raw = connected_flood_fill(&grid, level, &params).unwrap();
            assert!(raw.is_subset_of(&threshold_mask(&grid, level).unwrap()));

            let on_filled = connected_flood_fill(filled.grid(), level, &params).unwrap();
            assert!(on_filled.is_subset_of(&threshold_mask(filled.grid(), level).unwrap()));
        }
    }
}

#[test]
fn missing_cells_never_flood() {
    let grid = synthetic_dem();
    let stats = grid.statistics();
    let mask = threshold_mask(&grid, stats.max + 1.0).unwrap();
    assert_eq!(mask.flooded_count(), grid.valid_count());
    assert!(!mask.get(11, 5));
    assert!(!mask.get(0, SIZE / 2));
}

#[test]
fn processing_modes_agree() {
    let grid = synthetic_dem();
    let analyzer = MultiLevelAnalyzer::new(&grid);

    for method in methods(&grid) {
        let run = |mode| {
            analyzer
                .run(&AnalysisParams {
                    levels: levels_over(&grid, 9),
                    method: method.clone(),
                    mode,
                })
                .unwrap()
        };
        let sequential = run(ProcessingMode::Sequential);
        let parallel = run(ProcessingMode::Parallel);
        let pooled = run(ProcessingMode::ParallelWith(3));

        assert_eq!(sequential.results, parallel.results);
        assert_eq!(sequential.results, pooled.results);
        assert_eq!(sequential.summary(), pooled.summary());
    }
}

#[test]
fn area_uses_cell_geometry() {
    let grid = synthetic_dem();
    let stats = grid.statistics();
    let report = MultiLevelAnalyzer::new(&grid)
        .run(&AnalysisParams {
            levels: vec![stats.max],
            ..AnalysisParams::default()
        })
        .unwrap();
    assert_relative_eq!(report.results[0].metrics.area, grid.valid_count() as f64 * 4.0);
}

// ---------------------------------------------------------------------------
// Reference scenarios on the 5x5 nested bowl
// ---------------------------------------------------------------------------

#[test]
fn scenario_threshold_in_pit() {
    let grid = nested_bowl();
    let report = MultiLevelAnalyzer::new(&grid)
        .run(&AnalysisParams {
            levels: vec![0.5],
            ..AnalysisParams::default()
        })
        .unwrap();
    let result = &report.results[0];
    assert_eq!(result.mask.iter_flooded().collect::<Vec<_>>(), vec![(2, 2)]);
    assert_relative_eq!(result.metrics.area, 1.0);
    assert_relative_eq!(result.metrics.volume, 0.5);
    assert_relative_eq!(result.metrics.max_depth, 0.5);
}

#[test]
fn scenario_fill_lifts_block_to_rim() {
    let grid = nested_bowl();
    let filled = fill_depressions(&grid).unwrap();
    for row in 0..5 {
        for col in 0..5 {
            assert_eq!(filled.grid().elevation(row, col), Some(5.0));
        }
    }
    assert_eq!(filled.raised_cells(), 9);
}

#[test]
fn scenario_connected_fill_from_pit() {
    let grid = nested_bowl();
    let params = ConnectedFillParams::new(vec![(2, 2)], Connectivity::Four);

    let low = connected_flood_fill(&grid, 0.5, &params).unwrap();
    assert_eq!(low.iter_flooded().collect::<Vec<_>>(), vec![(2, 2)]);

    let high = connected_flood_fill(&grid, 1.5, &params).unwrap();
    let expected: Vec<(usize, usize)> =
        (1..4).flat_map(|r| (1..4).map(move |c| (r, c))).collect();
    assert_eq!(high.iter_flooded().collect::<Vec<_>>(), expected);
}

#[test]
fn scenario_empty_level_set() {
    let grid = nested_bowl();
    let result = MultiLevelAnalyzer::new(&grid).run(&AnalysisParams::default());
    assert!(matches!(result, Err(Error::EmptyLevelSet)));
}

#[test]
fn scenario_seed_on_missing_data() {
    let mut rows = vec![vec![5.0; 5]; 5];
    rows[2][2] = f64::NAN;
    let grid = Grid::from_rows(&rows).unwrap();
    let result = MultiLevelAnalyzer::new(&grid).run(&AnalysisParams {
        levels: vec![1.0],
        method: InundationMethod::ConnectedFill(ConnectedFillParams::new(
            vec![(2, 2)],
            Connectivity::Four,
        )),
        mode: ProcessingMode::Sequential,
    });
    assert!(matches!(
        result,
        Err(Error::InvalidSeed { row: 2, col: 2, reason: SeedRejection::MissingData })
    ));
}
