//! # floodgrid Core
//!
//! Core types, traits and I/O for the floodgrid inundation toolkit.
//!
//! This crate provides:
//! - `Grid`: elevation raster with a missing-data mask and cell geometry
//! - `GeoTransform`: origin and cell size used to turn cell counts into areas
//! - `Connectivity`: the shared 4/8 neighbor enumeration
//! - `FloodMask` / `DepthRaster`: per-level inundation outputs
//! - Collaborator traits for elevation sources and raster sinks, plus GeoTIFF I/O

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result, SeedRejection};
pub use raster::{
    Connectivity, DepthRaster, Extent, FloodMask, GeoTransform, Grid, GridStatistics,
    RasterBuffer,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result, SeedRejection};
    pub use crate::raster::{
        Connectivity, DepthRaster, Extent, FloodMask, GeoTransform, Grid, RasterBuffer,
    };
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in floodgrid.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
