//! Threshold inundation: no connectivity test

use floodgrid_core::{FloodMask, Grid, Result};
use ndarray::Zip;

use super::check_level;
use crate::hydrology::FilledGrid;

/// Flood every valid cell whose elevation is at or below `level`.
///
/// Hydraulically isolated basins below the level are included.
pub fn threshold_mask(surface: &Grid, level: f64) -> Result<FloodMask> {
    check_level(level)?;
    let cells = Zip::from(surface.elevations())
        .and(surface.missing_mask())
        .map_collect(|&z, &missing| !missing && z <= level);
    FloodMask::for_grid(surface, cells)
}

/// [`threshold_mask`] evaluated on the depression-filled surface.
///
/// Cells inside depressions whose spill elevation is above `level` stay dry.
pub fn filled_threshold_mask(filled: &FilledGrid, level: f64) -> Result<FloodMask> {
    threshold_mask(filled.grid(), level)
}
