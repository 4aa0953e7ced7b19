//! Water depth over the ground surface

use floodgrid_core::{DepthRaster, Error, FloodMask, Grid, Result};
use ndarray::Zip;

use super::check_level;

/// Depth of water at `level` over `ground`, for the cells in `mask`.
///
/// Flooded cells get `max(0, level - ground)`; every other cell is 0.
/// `ground` should be the raw grid even when the mask came from the
/// filled surface, so depths inside filled depressions are real water.
pub fn depth_raster(ground: &Grid, mask: &FloodMask, level: f64) -> Result<DepthRaster> {
    check_level(level)?;
    if mask.shape() != ground.shape() {
        let (ar, ac) = mask.shape();
        return Err(Error::SizeMismatch {
            er: ground.rows(),
            ec: ground.cols(),
            ar,
            ac,
        });
    }

    let depth = Zip::from(ground.elevations())
        .and(mask.data())
        .map_collect(|&z, &flooded| if flooded { (level - z).max(0.0) } else { 0.0 });

    DepthRaster::for_grid(ground, depth)
}
