//! # floodgrid Algorithms
//!
//! Depression filling and static inundation analysis for floodgrid.
//!
//! ## Available Algorithm Categories
//!
//! - **hydrology**: Priority-Flood depression filling
//! - **inundation**: Threshold and connected-fill flood masks, depth,
//!   flood metrics and multi-level analysis

pub mod hydrology;
pub mod inundation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hydrology::{
        fill_depressions, priority_flood, FilledGrid, PriorityFlood, PriorityFloodParams,
    };
    pub use crate::inundation::{
        connected_flood_fill, flood_metrics, threshold_mask, water_levels, AnalysisParams,
        AnalysisReport, CancellationToken, ConnectedFillParams, FloodMetrics, InundationEngine,
        InundationMethod, MultiLevel, MultiLevelAnalyzer, SeedPolicy, Surface,
    };
    pub use floodgrid_core::prelude::*;
    pub use floodgrid_parallel::ProcessingMode;
}
