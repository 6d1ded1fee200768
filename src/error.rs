//! Error types for grid_pathing

use thiserror::Error;

/// Errors that keep a search from starting, plus I/O failures of the export helpers.
///
/// Failing to find a path is not an error; see
/// [NotFoundReason](crate::solver::NotFoundReason).
#[derive(Error, Debug)]
pub enum PathfindingError {
    #[error("coordinates ({x}, {y}) are outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    #[error("{role} cell ({x}, {y}) is an obstacle")]
    Blocked { role: &'static str, x: i32, y: i32 },

    #[error("chunk size must be positive, got {0}")]
    InvalidChunkSize(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed grid: {0}")]
    MalformedGrid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("statistics table error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PathfindingError>;
