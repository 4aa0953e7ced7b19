//! Per-level inundation outputs

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Grid, RasterBuffer};
use ndarray::Array2;

/// Boolean grid marking flooded cells.
///
/// Has the dimensions of the grid it was derived from and is always false
/// on that grid's missing-data cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FloodMask {
    cells: Array2<bool>,
    transform: GeoTransform,
    flooded: usize,
}

impl FloodMask {
    /// Build a mask for `grid`, clearing any cell the grid marks missing
    pub fn for_grid(grid: &Grid, mut cells: Array2<bool>) -> Result<Self> {
        if cells.dim() != grid.shape() {
            let (ar, ac) = cells.dim();
            return Err(Error::SizeMismatch {
                er: grid.rows(),
                ec: grid.cols(),
                ar,
                ac,
            });
        }
        ndarray::Zip::from(&mut cells)
            .and(grid.missing_mask())
            .for_each(|c, &m| *c &= !m);
        let flooded = cells.iter().filter(|&&c| c).count();
        Ok(Self {
            cells,
            transform: *grid.transform(),
            flooded,
        })
    }

    /// An all-false mask for `grid`
    pub fn empty(grid: &Grid) -> Self {
        Self {
            cells: Array2::from_elem(grid.shape(), false),
            transform: *grid.transform(),
            flooded: 0,
        }
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Whether (row, col) is flooded; false out of bounds
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells.get((row, col)).copied().unwrap_or(false)
    }

    /// Number of flooded cells
    pub fn flooded_count(&self) -> usize {
        self.flooded
    }

    pub fn is_all_dry(&self) -> bool {
        self.flooded == 0
    }

    /// Flooded cells in row-major order
    pub fn iter_flooded(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .indexed_iter()
            .filter(|&(_, &c)| c)
            .map(|(idx, _)| idx)
    }

    /// Every cell flooded here is also flooded in `other`
    pub fn is_subset_of(&self, other: &FloodMask) -> bool {
        self.shape() == other.shape()
            && self
                .cells
                .iter()
                .zip(other.cells.iter())
                .all(|(&a, &b)| !a || b)
    }

    pub fn data(&self) -> &Array2<bool> {
        &self.cells
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Export as 0/1 bytes; the mask itself has no missing cells
    pub fn to_buffer(&self) -> RasterBuffer<u8> {
        let (rows, cols) = self.shape();
        RasterBuffer {
            rows,
            cols,
            data: self.cells.iter().map(|&c| u8::from(c)).collect(),
            missing: vec![false; rows * cols],
            transform: self.transform,
        }
    }
}

/// Water depth per cell: `max(0, level - ground)` where flooded, else 0
#[derive(Debug, Clone, PartialEq)]
pub struct DepthRaster {
    depth: Array2<f64>,
    missing: Array2<bool>,
    transform: GeoTransform,
}

impl DepthRaster {
    /// Depths for `grid`; missing cells are forced to 0
    pub fn for_grid(grid: &Grid, mut depth: Array2<f64>) -> Result<Self> {
        if depth.dim() != grid.shape() {
            let (ar, ac) = depth.dim();
            return Err(Error::SizeMismatch {
                er: grid.rows(),
                ec: grid.cols(),
                ar,
                ac,
            });
        }
        ndarray::Zip::from(&mut depth)
            .and(grid.missing_mask())
            .for_each(|d, &m| {
                if m {
                    *d = 0.0;
                }
            });
        Ok(Self {
            depth,
            missing: grid.missing_mask().clone(),
            transform: *grid.transform(),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.depth.dim()
    }

    /// Depth at (row, col); 0 out of bounds
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.depth.get((row, col)).copied().unwrap_or(0.0)
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.depth
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Export with the source grid's missing-data mask
    pub fn to_buffer(&self) -> RasterBuffer<f64> {
        RasterBuffer::from_arrays(&self.depth, &self.missing, self.transform)
    }
}
