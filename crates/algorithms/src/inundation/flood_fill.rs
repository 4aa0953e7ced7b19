//! Connected flood fill from seed points
//!
//! Multi-source breadth-first expansion: a cell floods when it is valid,
//! at or below the water level, and joined to a seed through cells that
//! already flooded. The result is the closure of the seeds under that
//! predicate, so queue order only affects speed, never the mask.

use std::collections::VecDeque;

use floodgrid_core::{Connectivity, Error, FloodMask, Grid, Result, SeedRejection};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::check_level;

/// What to do with a seed that sits above the water level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedPolicy {
    /// Fail with [`Error::InvalidSeed`]
    #[default]
    Reject,
    /// Ignore the seed for that level
    Skip,
}

/// Elevation surface the connected fill is evaluated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// The grid as supplied
    #[default]
    Raw,
    /// The depression-filled grid
    Filled,
}

/// Parameters for connected flood fill
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectedFillParams {
    /// Seed cells as (row, col)
    pub seeds: Vec<(usize, usize)>,
    /// Adjacency used when growing the flooded region
    pub connectivity: Connectivity,
    pub seed_policy: SeedPolicy,
    pub surface: Surface,
}

impl ConnectedFillParams {
    pub fn new(seeds: Vec<(usize, usize)>, connectivity: Connectivity) -> Self {
        Self {
            seeds,
            connectivity,
            ..Self::default()
        }
    }
}

/// Check that there is at least one seed and every seed is a valid cell.
///
/// Level-independent; the above-water-level test happens per fill.
pub fn validate_seeds(grid: &Grid, seeds: &[(usize, usize)]) -> Result<()> {
    if seeds.is_empty() {
        return Err(Error::invalid_parameter(
            "seeds",
            "[]",
            "connected fill needs at least one seed",
        ));
    }
    for &(row, col) in seeds {
        if !grid.in_bounds(row, col) {
            return Err(Error::InvalidSeed {
                row,
                col,
                reason: SeedRejection::OutOfBounds {
                    rows: grid.rows(),
                    cols: grid.cols(),
                },
            });
        }
        if !grid.is_valid(row, col) {
            return Err(Error::InvalidSeed {
                row,
                col,
                reason: SeedRejection::MissingData,
            });
        }
    }
    Ok(())
}

/// Flood the region of `surface` connected to the seeds at `level`.
///
/// `params.surface` is resolved by the caller; this function evaluates
/// whatever grid it is handed.
///
/// # Errors
/// - [`Error::InvalidParameter`] for a non-finite level or an empty seed list
/// - [`Error::InvalidSeed`] for a seed out of bounds or on missing data, or
///   above the level under [`SeedPolicy::Reject`]
pub fn connected_flood_fill(
    surface: &Grid,
    level: f64,
    params: &ConnectedFillParams,
) -> Result<FloodMask> {
    check_level(level)?;
    validate_seeds(surface, &params.seeds)?;

    let mut flooded = Array2::<bool>::from_elem(surface.shape(), false);
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    let mut skipped = 0usize;

    for &(row, col) in &params.seeds {
        let elevation = surface.elevation(row, col).ok_or(Error::InvalidSeed {
            row,
            col,
            reason: SeedRejection::MissingData,
        })?;

        if elevation > level {
            match params.seed_policy {
                SeedPolicy::Reject => {
                    return Err(Error::InvalidSeed {
                        row,
                        col,
                        reason: SeedRejection::AboveWaterLevel { elevation, level },
                    });
                }
                SeedPolicy::Skip => {
                    skipped += 1;
                    continue;
                }
            }
        }

        if !flooded[(row, col)] {
            flooded[(row, col)] = true;
            queue.push_back((row, col));
        }
    }

    while let Some((row, col)) = queue.pop_front() {
        for (nr, nc) in surface.neighbors(row, col, params.connectivity) {
            if flooded[(nr, nc)] {
                continue;
            }
            if surface.elevation(nr, nc).is_some_and(|z| z <= level) {
                flooded[(nr, nc)] = true;
                queue.push_back((nr, nc));
            }
        }
    }

    if skipped > 0 {
        debug!(level, skipped, seeds = params.seeds.len(), "seeds above water level skipped");
    }

    FloodMask::for_grid(surface, flooded)
}
