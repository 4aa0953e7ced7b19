//! Static inundation modeling
//!
//! Derives flood masks from an elevation grid at one or more water levels:
//! - Simple threshold: every valid cell at or below the level
//! - Filled threshold: the same test against the depression-filled surface
//! - Connected fill: cells below the level reachable from seed points
//!
//! Each mask comes with a depth raster, and the multi-level analyzer turns
//! them into per-level area, volume and maximum depth.

mod depth;
mod engine;
mod flood_fill;
mod metrics;
mod multi_level;
mod threshold;

pub use depth::depth_raster;
pub use engine::{Inundation, InundationEngine, InundationMethod};
pub use flood_fill::{connected_flood_fill, validate_seeds, ConnectedFillParams, SeedPolicy, Surface};
pub use metrics::{flood_metrics, FloodMetrics};
pub use multi_level::{
    water_levels, AnalysisParams, AnalysisReport, AnalysisResult, CancellationToken,
    LevelFailure, LevelSummary, MultiLevel, MultiLevelAnalyzer,
};
pub use threshold::{filled_threshold_mask, threshold_mask};

use floodgrid_core::{Error, Result};

/// Water levels must be finite; negative values are fine
pub(crate) fn check_level(level: f64) -> Result<()> {
    if level.is_finite() {
        Ok(())
    } else {
        Err(Error::invalid_parameter("level", level, "water level must be finite"))
    }
}
