//! Flat buffer shape handed to export collaborators

use crate::raster::GeoTransform;
use ndarray::Array2;

/// Row-major values, a parallel missing-data mask and cell geometry.
///
/// This is the `(buffer, mask, geometry)` shape consumed by raster sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer<T> {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<T>,
    pub missing: Vec<bool>,
    pub transform: GeoTransform,
}

impl<T: Copy> RasterBuffer<T> {
    pub(crate) fn from_arrays(
        data: &Array2<T>,
        missing: &Array2<bool>,
        transform: GeoTransform,
    ) -> Self {
        let (rows, cols) = data.dim();
        Self {
            rows,
            cols,
            data: data.iter().copied().collect(),
            missing: missing.iter().copied().collect(),
            transform,
        }
    }

    /// Convert every value, keeping mask and geometry
    pub fn map<U>(self, f: impl Fn(T) -> U) -> RasterBuffer<U> {
        RasterBuffer {
            rows: self.rows,
            cols: self.cols,
            data: self.data.into_iter().map(f).collect(),
            missing: self.missing,
            transform: self.transform,
        }
    }
}
