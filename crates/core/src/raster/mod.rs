//! Raster data structures and operations

mod buffer;
mod geotransform;
mod grid;
mod mask;
mod neighborhood;

pub use buffer::RasterBuffer;
pub use geotransform::{Extent, GeoTransform};
pub use grid::{Grid, GridStatistics};
pub(crate) use grid::is_nodata_value;
pub use mask::{DepthRaster, FloodMask};
pub use neighborhood::{Connectivity, Neighbors};
