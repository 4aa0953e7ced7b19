//! Hydrological conditioning of elevation grids
//!
//! - Priority-Flood: optimal O(n log n) depression filling (Barnes 2014)
//! - Depression depth: per-cell storage removed by filling

mod priority_flood;

pub use priority_flood::{
    depression_depth, fill_depressions, priority_flood, FilledGrid, PriorityFlood,
    PriorityFloodParams,
};
