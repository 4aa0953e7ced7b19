//! Aggregate flood statistics

use floodgrid_core::{DepthRaster, Error, FloodMask, Result};
use serde::{Deserialize, Serialize};

/// Summary of one flooded surface
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FloodMetrics {
    /// Number of flooded cells
    pub flooded_cells: usize,
    /// Flooded cells times cell area
    pub area: f64,
    /// Sum of depth times cell area over flooded cells
    pub volume: f64,
    /// Largest depth over flooded cells, 0 when nothing floods
    pub max_depth: f64,
}

/// Compute area, volume and maximum depth.
///
/// `cell_area` is in squared map units and must be finite and positive.
pub fn flood_metrics(mask: &FloodMask, depth: &DepthRaster, cell_area: f64) -> Result<FloodMetrics> {
    if !cell_area.is_finite() || cell_area <= 0.0 {
        return Err(Error::invalid_parameter(
            "cell_area",
            cell_area,
            "must be finite and positive",
        ));
    }
    if mask.shape() != depth.shape() {
        let (er, ec) = mask.shape();
        let (ar, ac) = depth.shape();
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }

    let mut depth_sum = 0.0;
    let mut max_depth = 0.0_f64;
    for (row, col) in mask.iter_flooded() {
        let d = depth.get(row, col);
        depth_sum += d;
        max_depth = max_depth.max(d);
    }

    let flooded_cells = mask.flooded_count();
    Ok(FloodMetrics {
        flooded_cells,
        area: flooded_cells as f64 * cell_area,
        volume: depth_sum * cell_area,
        max_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inundation::{depth_raster, threshold_mask};
    use approx::assert_relative_eq;
    use floodgrid_core::{GeoTransform, Grid};
    use ndarray::array;

    fn bowl(cell: f64) -> Grid {
        let elevation = array![[5.0, 5.0, 5.0], [5.0, 0.0, 5.0], [5.0, 5.0, 5.0]];
        Grid::from_array(elevation, GeoTransform::new(0.0, 0.0, cell, -cell)).unwrap()
    }

    fn metrics_at(grid: &Grid, level: f64) -> FloodMetrics {
        let mask = threshold_mask(grid, level).unwrap();
        let depth = depth_raster(grid, &mask, level).unwrap();
        flood_metrics(&mask, &depth, grid.cell_area()).unwrap()
    }

    #[test]
    fn test_single_pit() {
        let m = metrics_at(&bowl(1.0), 0.5);
        assert_eq!(m.flooded_cells, 1);
        assert_relative_eq!(m.area, 1.0);
        assert_relative_eq!(m.volume, 0.5);
        assert_relative_eq!(m.max_depth, 0.5);
    }

    #[test]
    fn test_cell_area_scales_area_and_volume() {
        let m = metrics_at(&bowl(10.0), 0.5);
        assert_relative_eq!(m.area, 100.0);
        assert_relative_eq!(m.volume, 50.0);
        assert_relative_eq!(m.max_depth, 0.5);
    }

    #[test]
    fn test_all_dry() {
        let m = metrics_at(&bowl(1.0), -1.0);
        assert_eq!(m, FloodMetrics::default());
    }

    #[test]
    fn test_everything_flooded() {
        let m = metrics_at(&bowl(1.0), 6.0);
        assert_eq!(m.flooded_cells, 9);
        assert_relative_eq!(m.volume, 8.0 * 1.0 + 6.0);
        assert_relative_eq!(m.max_depth, 6.0);
    }

    #[test]
    fn test_invalid_cell_area() {
        let grid = bowl(1.0);
        let mask = threshold_mask(&grid, 1.0).unwrap();
        let depth = depth_raster(&grid, &mask, 1.0).unwrap();
        assert!(flood_metrics(&mask, &depth, 0.0).is_err());
        assert!(flood_metrics(&mask, &depth, f64::NAN).is_err());
    }
}
