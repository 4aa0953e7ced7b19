//! Elevation grid with missing-data mask

use crate::error::{Error, Result};
use crate::raster::{Connectivity, Extent, GeoTransform, Neighbors, RasterBuffer};
use ndarray::Array2;

/// An elevation raster with a missing-data mask and cell geometry.
///
/// A cell is *valid* when it is in bounds and not marked missing. Every
/// valid cell holds a finite elevation, and a `Grid` always has at least
/// one valid cell.
///
/// # Example
///
/// ```ignore
/// use floodgrid_core::Grid;
///
/// let grid = Grid::from_rows(&[
///     vec![5.0, 5.0, 5.0],
///     vec![5.0, 1.0, 5.0],
///     vec![5.0, 5.0, 5.0],
/// ])?;
/// assert_eq!(grid.elevation(1, 1), Some(1.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Elevations in row-major order (row, col)
    elevation: Array2<f64>,
    /// True where the cell has no valid measurement
    missing: Array2<bool>,
    /// Cell geometry
    transform: GeoTransform,
    /// Number of valid cells
    valid_count: usize,
}

impl Grid {
    /// Create a grid from elevations, an explicit missing-data mask and geometry.
    ///
    /// Non-finite elevations are folded into the missing-data mask.
    pub fn new(
        elevation: Array2<f64>,
        mut missing: Array2<bool>,
        transform: GeoTransform,
    ) -> Result<Self> {
        let (rows, cols) = elevation.dim();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidGrid(format!(
                "grid must be non-empty, got {} x {}",
                rows, cols
            )));
        }
        if missing.dim() != (rows, cols) {
            let (mr, mc) = missing.dim();
            return Err(Error::InvalidGrid(format!(
                "missing-data mask is {} x {}, elevation is {} x {}",
                mr, mc, rows, cols
            )));
        }
        transform.validate()?;

        ndarray::Zip::from(&mut missing)
            .and(&elevation)
            .for_each(|m, &z| {
                if !z.is_finite() {
                    *m = true;
                }
            });

        let valid_count = missing.iter().filter(|&&m| !m).count();
        if valid_count == 0 {
            return Err(Error::InvalidGrid(
                "grid has no valid (non-missing) cells".into(),
            ));
        }

        Ok(Self {
            elevation,
            missing,
            transform,
            valid_count,
        })
    }

    /// Create a grid from an array where NaN marks missing data
    pub fn from_array(elevation: Array2<f64>, transform: GeoTransform) -> Result<Self> {
        let missing = Array2::from_elem(elevation.dim(), false);
        Self::new(elevation, missing, transform)
    }

    /// Create a grid from a row-major buffer.
    ///
    /// Cells equal to `nodata` (or NaN) are marked missing.
    pub fn from_vec(
        data: Vec<f64>,
        rows: usize,
        cols: usize,
        nodata: Option<f64>,
        transform: GeoTransform,
    ) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidGrid(format!(
                "buffer of {} values cannot form a {} x {} grid",
                data.len(),
                rows,
                cols
            )));
        }
        let missing: Vec<bool> = data
            .iter()
            .map(|&z| is_nodata_value(z, nodata))
            .collect();
        let elevation = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::InvalidGrid(e.to_string()))?;
        let missing = Array2::from_shape_vec((rows, cols), missing)
            .map_err(|e| Error::InvalidGrid(e.to_string()))?;
        Self::new(elevation, missing, transform)
    }

    /// Create a grid with unit square cells from nested rows.
    ///
    /// Fails with [`Error::InvalidGrid`] on empty or ragged input.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(Error::InvalidGrid(format!(
                "row {} has {} columns, expected {}",
                idx,
                row.len(),
                cols
            )));
        }
        let data: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::from_vec(data, rows.len(), cols, None, GeoTransform::default())
    }

    /// Derive a grid with new elevations, sharing this grid's mask and geometry
    pub fn with_elevation(&self, elevation: Array2<f64>) -> Result<Self> {
        if elevation.dim() != self.shape() {
            let (ar, ac) = elevation.dim();
            return Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar,
                ac,
            });
        }
        Self::new(elevation, self.missing.clone(), self.transform)
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.elevation.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.elevation.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.elevation.dim()
    }

    /// Total number of cells, valid or not
    pub fn len(&self) -> usize {
        self.elevation.len()
    }

    /// Always false: construction rejects empty grids
    pub fn is_empty(&self) -> bool {
        self.elevation.is_empty()
    }

    /// Number of valid cells
    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    // Cell access

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows() && col < self.cols()
    }

    /// In bounds and not missing
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.missing.get((row, col)).is_some_and(|&m| !m)
    }

    /// Elevation at (row, col), or `None` for out-of-bounds and missing cells
    pub fn elevation(&self, row: usize, col: usize) -> Option<f64> {
        if self.is_valid(row, col) {
            Some(self.elevation[(row, col)])
        } else {
            None
        }
    }

    /// Raw elevation array; values at missing cells are unspecified
    pub fn elevations(&self) -> &Array2<f64> {
        &self.elevation
    }

    /// Missing-data mask, true where the cell is missing
    pub fn missing_mask(&self) -> &Array2<bool> {
        &self.missing
    }

    /// In-bounds neighbors of a cell under the given connectivity
    pub fn neighbors(&self, row: usize, col: usize, connectivity: Connectivity) -> Neighbors {
        connectivity.neighbors(row, col, self.rows(), self.cols())
    }

    /// Whether a valid cell drains directly: it lies on the grid edge or is
    /// edge-adjacent to a missing-data cell
    pub fn is_outlet_adjacent(&self, row: usize, col: usize) -> bool {
        if !self.is_valid(row, col) {
            return false;
        }
        if row == 0 || col == 0 || row + 1 == self.rows() || col + 1 == self.cols() {
            return true;
        }
        self.neighbors(row, col, Connectivity::Four)
            .any(|(nr, nc)| self.missing[(nr, nc)])
    }

    // Geometry

    /// Cell geometry
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Area of one cell in squared real-world units
    pub fn cell_area(&self) -> f64 {
        self.transform.cell_area()
    }

    /// Real-world bounds
    pub fn bounds(&self) -> Extent {
        self.transform.bounds(self.cols(), self.rows())
    }

    // Export

    /// Buffer/mask/geometry view for raster export collaborators
    pub fn to_buffer(&self) -> RasterBuffer<f64> {
        RasterBuffer::from_arrays(&self.elevation, &self.missing, self.transform)
    }

    // Statistics

    /// Elevation statistics over valid cells
    pub fn statistics(&self) -> GridStatistics {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;

        for (&z, &m) in self.elevation.iter().zip(self.missing.iter()) {
            if m {
                continue;
            }
            min = min.min(z);
            max = max.max(z);
            sum += z;
        }

        GridStatistics {
            min,
            max,
            mean: sum / self.valid_count as f64,
            valid_count: self.valid_count,
            missing_count: self.len() - self.valid_count,
        }
    }
}

/// Basic statistics for a grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid_count: usize,
    pub missing_count: usize,
}

/// NaN is always missing; otherwise compare against the sentinel
pub(crate) fn is_nodata_value(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match nodata {
        Some(nd) if nd.is_nan() => false,
        Some(nd) => value == nd || (value - nd).abs() <= f64::EPSILON * nd.abs().max(1.0),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bowl() -> Grid {
        Grid::from_rows(&[
            vec![5.0, 5.0, 5.0, 5.0, 5.0],
            vec![5.0, 1.0, 1.0, 1.0, 5.0],
            vec![5.0, 1.0, 0.0, 1.0, 5.0],
            vec![5.0, 1.0, 1.0, 1.0, 5.0],
            vec![5.0, 5.0, 5.0, 5.0, 5.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_grid_creation() {
        let grid = bowl();
        assert_eq!(grid.shape(), (5, 5));
        assert_eq!(grid.valid_count(), 25);
        assert_eq!(grid.elevation(2, 2), Some(0.0));
        assert_eq!(grid.elevation(5, 0), None);
        assert_eq!(grid.cell_area(), 1.0);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Grid::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(Error::InvalidGrid(_))));
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert!(matches!(Grid::from_rows(&[]), Err(Error::InvalidGrid(_))));
        assert!(matches!(
            Grid::from_rows(&[vec![], vec![]]),
            Err(Error::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_all_missing_rejected() {
        let result = Grid::from_vec(vec![-9999.0; 4], 2, 2, Some(-9999.0), GeoTransform::default());
        assert!(matches!(result, Err(Error::InvalidGrid(_))));
    }

    #[test]
    fn test_mask_dimension_mismatch_rejected() {
        let elevation = Array2::zeros((3, 3));
        let missing = Array2::from_elem((3, 2), false);
        let result = Grid::new(elevation, missing, GeoTransform::default());
        assert!(matches!(result, Err(Error::InvalidGrid(_))));
    }

    #[test]
    fn test_nodata_and_nan_marked_missing() {
        let grid = Grid::from_vec(
            vec![1.0, -9999.0, f64::NAN, 4.0],
            2,
            2,
            Some(-9999.0),
            GeoTransform::default(),
        )
        .unwrap();
        assert!(grid.is_valid(0, 0));
        assert!(!grid.is_valid(0, 1));
        assert!(!grid.is_valid(1, 0));
        assert_eq!(grid.valid_count(), 2);
    }

    #[test]
    fn test_outlet_adjacency() {
        let mut rows = vec![vec![3.0; 5]; 5];
        rows[2][3] = f64::NAN;
        let grid = Grid::from_rows(&rows).unwrap();

        assert!(grid.is_outlet_adjacent(0, 2), "edge cell drains");
        assert!(grid.is_outlet_adjacent(2, 2), "next to missing data");
        assert!(!grid.is_outlet_adjacent(1, 1), "interior cell");
        assert!(!grid.is_outlet_adjacent(1, 2), "diagonal to missing data only");
        assert!(!grid.is_outlet_adjacent(2, 3), "missing cells are not outlets themselves");
    }

    #[test]
    fn test_statistics_skip_missing() {
        let grid = Grid::from_rows(&[vec![1.0, f64::NAN], vec![3.0, 8.0]]).unwrap();
        let stats = grid.statistics();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 8.0);
        assert_eq!(stats.mean, 4.0);
        assert_eq!(stats.missing_count, 1);
    }

    #[test]
    fn test_with_elevation_checks_shape() {
        let grid = bowl();
        assert!(matches!(
            grid.with_elevation(Array2::zeros((2, 2))),
            Err(Error::SizeMismatch { .. })
        ));
        let raised = grid.with_elevation(Array2::from_elem((5, 5), 7.0)).unwrap();
        assert_eq!(raised.elevation(0, 0), Some(7.0));
    }
}
