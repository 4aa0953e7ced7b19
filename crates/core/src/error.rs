//! Error types for floodgrid

use std::fmt;
use thiserror::Error;

/// Why a seed cell was refused by connected flood fill
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedRejection {
    /// Seed lies outside the grid
    OutOfBounds { rows: usize, cols: usize },
    /// Seed lies on a missing-data cell
    MissingData,
    /// Seed elevation is above the requested water level
    AboveWaterLevel { elevation: f64, level: f64 },
}

impl fmt::Display for SeedRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedRejection::OutOfBounds { rows, cols } => {
                write!(f, "outside grid of size ({}, {})", rows, cols)
            }
            SeedRejection::MissingData => write!(f, "on a missing-data cell"),
            SeedRejection::AboveWaterLevel { elevation, level } => {
                write!(f, "elevation {} is above water level {}", elevation, level)
            }
        }
    }
}

/// Main error type for floodgrid operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Disconnected grid: {unresolved} valid cells have no reachable outlet")]
    DisconnectedGrid { unresolved: usize },

    #[error("Invalid seed ({row}, {col}): {reason}")]
    InvalidSeed {
        row: usize,
        col: usize,
        reason: SeedRejection,
    },

    #[error("No water levels supplied")]
    EmptyLevelSet,

    #[error("No input data: {0}")]
    NoInputData(String),

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Analysis cancelled before water level {level}")]
    Cancelled { level: f64 },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidParameter`]
    pub fn invalid_parameter(
        name: &'static str,
        value: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for floodgrid operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_error_message() {
        let err = Error::InvalidSeed {
            row: 2,
            col: 3,
            reason: SeedRejection::AboveWaterLevel {
                elevation: 4.0,
                level: 1.5,
            },
        };
        assert_eq!(
            err.to_string(),
            "Invalid seed (2, 3): elevation 4 is above water level 1.5"
        );
    }

    #[test]
    fn test_invalid_parameter_shorthand() {
        let err = Error::invalid_parameter("epsilon", -1.0, "must be >= 0");
        assert_eq!(err.to_string(), "Invalid parameter: epsilon = -1 (must be >= 0)");
    }
}
