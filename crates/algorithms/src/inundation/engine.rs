//! Single-level inundation over one grid

use floodgrid_core::{DepthRaster, Error, FloodMask, Grid, Result};
use serde::{Deserialize, Serialize};

use super::{connected_flood_fill, depth_raster, threshold_mask, ConnectedFillParams, Surface};
use crate::hydrology::FilledGrid;

/// How a flood mask is derived from the grid and a water level
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum InundationMethod {
    /// Every valid cell at or below the level
    #[default]
    SimpleThreshold,
    /// Threshold on the depression-filled surface
    FilledThreshold,
    /// Cells at or below the level connected to seed points
    ConnectedFill(ConnectedFillParams),
}

impl InundationMethod {
    pub fn name(&self) -> &'static str {
        match self {
            InundationMethod::SimpleThreshold => "simple_threshold",
            InundationMethod::FilledThreshold => "filled_threshold",
            InundationMethod::ConnectedFill(_) => "connected_fill",
        }
    }

    /// Whether this method evaluates the filled surface
    pub fn needs_filled(&self) -> bool {
        match self {
            InundationMethod::SimpleThreshold => false,
            InundationMethod::FilledThreshold => true,
            InundationMethod::ConnectedFill(p) => p.surface == Surface::Filled,
        }
    }
}

/// Mask and depth for one water level
#[derive(Debug, Clone, PartialEq)]
pub struct Inundation {
    pub level: f64,
    pub mask: FloodMask,
    pub depth: DepthRaster,
}

/// Evaluates inundation methods against a grid and, optionally, its
/// filled surface.
///
/// Depth is always measured against the raw grid.
#[derive(Debug, Clone, Copy)]
pub struct InundationEngine<'a> {
    grid: &'a Grid,
    filled: Option<&'a FilledGrid>,
}

impl<'a> InundationEngine<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid, filled: None }
    }

    /// Attach the filled surface used by methods that need it
    pub fn with_filled(mut self, filled: &'a FilledGrid) -> Result<Self> {
        if filled.grid().shape() != self.grid.shape() {
            let (ar, ac) = filled.grid().shape();
            return Err(Error::SizeMismatch {
                er: self.grid.rows(),
                ec: self.grid.cols(),
                ar,
                ac,
            });
        }
        self.filled = Some(filled);
        Ok(self)
    }

    pub fn grid(&self) -> &'a Grid {
        self.grid
    }

    fn filled_surface(&self, method: &InundationMethod) -> Result<&'a Grid> {
        self.filled.map(FilledGrid::grid).ok_or_else(|| {
            Error::invalid_parameter(
                "method",
                method.name(),
                "requires a filled surface; attach one with with_filled",
            )
        })
    }

    /// Flood mask for `level` under `method`
    pub fn flood_mask(&self, level: f64, method: &InundationMethod) -> Result<FloodMask> {
        match method {
            InundationMethod::SimpleThreshold => threshold_mask(self.grid, level),
            InundationMethod::FilledThreshold => {
                threshold_mask(self.filled_surface(method)?, level)
            }
            InundationMethod::ConnectedFill(params) => {
                let surface = match params.surface {
                    Surface::Raw => self.grid,
                    Surface::Filled => self.filled_surface(method)?,
                };
                connected_flood_fill(surface, level, params)
            }
        }
    }

    /// Mask plus depth over the raw grid
    pub fn inundate(&self, level: f64, method: &InundationMethod) -> Result<Inundation> {
        let mask = self.flood_mask(level, method)?;
        let depth = depth_raster(self.grid, &mask, level)?;
        Ok(Inundation { level, mask, depth })
    }
}
