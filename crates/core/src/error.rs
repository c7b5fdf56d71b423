//! Error types for riverine

use thiserror::Error;

/// Main error type for riverine operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Worker failure: {0}")]
    Worker(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for riverine operations
pub type Result<T> = std::result::Result<T, Error>;
