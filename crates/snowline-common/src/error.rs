//! Error types for the snowline crates.

use thiserror::Error;

/// Result type alias using SnowlineError.
pub type SnowlineResult<T> = Result<T, SnowlineError>;

/// Primary error type for raster, grid and persistence operations.
#[derive(Debug, Error)]
pub enum SnowlineError {
    // === Raster Errors ===
    #[error("Invalid raster: {0}")]
    Validation(String),

    #[error("Incompatible rasters: {0}")]
    Compatibility(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    // === Grid Errors ===
    #[error("Invalid grid configuration: {0}")]
    Config(String),

    // === Persistence Errors ===
    #[error("Malformed archive: {0}")]
    Structural(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl SnowlineError {
    /// Create a ShapeMismatch error from two `(rows, cols)` pairs.
    pub fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::ShapeMismatch {
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }

    /// Create a Structural error.
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            SnowlineError::Validation(_) => "validation",
            SnowlineError::Compatibility(_) => "compatibility",
            SnowlineError::ShapeMismatch { .. } => "shape",
            SnowlineError::Config(_) => "config",
            SnowlineError::Structural(_) => "structural",
            SnowlineError::InvalidTimestamp(_) => "timestamp",
            SnowlineError::Io(_) => "io",
            SnowlineError::Json(_) => "json",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for SnowlineError {
    fn from(err: std::io::Error) -> Self {
        SnowlineError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SnowlineError {
    fn from(err: serde_json::Error) -> Self {
        SnowlineError::Json(err.to_string())
    }
}
