//! Collaborator contracts for acquiring elevation data and exporting rasters
//!
//! The algorithms only see in-memory [`Grid`]s. Where the grid comes from
//! and where results go is delegated to an [`ElevationSource`] and a
//! [`RasterSink`]. A GeoTIFF implementation of both ships in this module.

mod native;

pub use native::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer,
    GeoTiffSink, GeoTiffSource,
};

use crate::error::{Error, Result};
use crate::raster::{Extent, Grid, RasterBuffer};
use ndarray::s;
use tracing::{debug, warn};

/// Error type returned by elevation sources
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies an elevation grid for a requested extent
pub trait ElevationSource {
    /// Human-readable name of the source, used in error messages
    fn describe(&self) -> String;

    /// Fetch the grid covering `extent`, or the whole dataset when `None`
    fn fetch(&self, extent: Option<&Extent>) -> std::result::Result<Grid, SourceError>;
}

/// Accepts finished rasters for persistence
pub trait RasterSink {
    /// Write one named raster
    fn write_raster(&mut self, name: &str, raster: &RasterBuffer<f64>) -> Result<()>;
}

/// Fetch a grid from `source`.
///
/// Any failure of the source is surfaced as [`Error::NoInputData`]; no
/// retry is attempted.
pub fn acquire<S: ElevationSource + ?Sized>(source: &S, extent: Option<&Extent>) -> Result<Grid> {
    match source.fetch(extent) {
        Ok(grid) => {
            debug!(
                source = %source.describe(),
                rows = grid.rows(),
                cols = grid.cols(),
                "elevation grid acquired"
            );
            Ok(grid)
        }
        Err(e) => {
            warn!(source = %source.describe(), error = %e, "elevation source failed");
            Err(Error::NoInputData(format!("{}: {}", source.describe(), e)))
        }
    }
}

/// Cut the window of `grid` that intersects `extent`.
///
/// Partially covered cells are included. Fails with [`Error::InvalidGrid`]
/// when the extent is degenerate, misses the grid, or covers only missing data.
pub fn crop_to_extent(grid: &Grid, extent: &Extent) -> Result<Grid> {
    if !extent.is_valid() {
        return Err(Error::InvalidGrid(format!("degenerate extent {:?}", extent)));
    }

    let gt = grid.transform();
    let (c0, r0) = gt.geo_to_pixel(extent.min_x, extent.max_y);
    let (c1, r1) = gt.geo_to_pixel(extent.max_x, extent.min_y);

    let clamp = |v: f64, hi: usize| -> usize { v.max(0.0).min(hi as f64) as usize };
    let col_start = clamp(c0.min(c1).floor(), grid.cols());
    let col_end = clamp(c0.max(c1).ceil(), grid.cols());
    let row_start = clamp(r0.min(r1).floor(), grid.rows());
    let row_end = clamp(r0.max(r1).ceil(), grid.rows());

    if col_start >= col_end || row_start >= row_end {
        return Err(Error::InvalidGrid(format!(
            "extent {:?} does not intersect grid bounds {:?}",
            extent,
            grid.bounds()
        )));
    }

    let elevation = grid
        .elevations()
        .slice(s![row_start..row_end, col_start..col_end])
        .to_owned();
    let missing = grid
        .missing_mask()
        .slice(s![row_start..row_end, col_start..col_end])
        .to_owned();

    Grid::new(elevation, missing, gt.shifted(row_start, col_start))
}
