//! Cell geometry for grids

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// North-up cell geometry for a grid.
///
/// Converts between cell coordinates (col, row) and real-world coordinates (x, y):
/// ```text
/// x = origin_x + col * cell_width
/// y = origin_y + row * cell_height
/// ```
///
/// `cell_height` is usually negative (rows grow southwards). Only the
/// magnitudes enter area and volume calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X direction
    pub cell_width: f64,
    /// Cell size in Y direction, usually negative
    pub cell_height: f64,
}

/// Axis-aligned bounding box in the grid's coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Whether the extent encloses a positive, finite area
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.max_x > self.min_x
            && self.max_y > self.min_y
    }
}

impl GeoTransform {
    /// Create a new north-up transform
    pub fn new(origin_x: f64, origin_y: f64, cell_width: f64, cell_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            cell_width,
            cell_height,
        }
    }

    /// Reject non-finite coordinates and zero-sized cells
    pub fn validate(&self) -> Result<()> {
        let finite = [self.origin_x, self.origin_y, self.cell_width, self.cell_height]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(Error::InvalidGrid(format!(
                "geometry must be finite, got {:?}",
                self
            )));
        }
        if self.cell_width == 0.0 || self.cell_height == 0.0 {
            return Err(Error::InvalidGrid(format!(
                "cell size must be non-zero, got {} x {}",
                self.cell_width, self.cell_height
            )));
        }
        Ok(())
    }

    /// Area covered by one cell, in squared real-world units
    pub fn cell_area(&self) -> f64 {
        (self.cell_width * self.cell_height).abs()
    }

    /// Cell center in real-world coordinates
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.cell_width;
        let y = self.origin_y + (row as f64 + 0.5) * self.cell_height;
        (x, y)
    }

    /// Fractional (col, row) for a real-world coordinate; floor for indices
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.cell_width,
            (y - self.origin_y) / self.cell_height,
        )
    }

    /// Transform of a sub-window starting at (row_offset, col_offset)
    pub fn shifted(&self, row_offset: usize, col_offset: usize) -> Self {
        Self {
            origin_x: self.origin_x + col_offset as f64 * self.cell_width,
            origin_y: self.origin_y + row_offset as f64 * self.cell_height,
            ..*self
        }
    }

    /// Bounding box of a grid with the given dimensions
    pub fn bounds(&self, cols: usize, rows: usize) -> Extent {
        let x0 = self.origin_x;
        let x1 = self.origin_x + cols as f64 * self.cell_width;
        let y0 = self.origin_y;
        let y1 = self.origin_y + rows as f64 * self.cell_height;
        Extent::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
