//! Error types for the ingestion crate.

use thiserror::Error;

use snowline_common::SnowlineError;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error(transparent)]
    Raster(#[from] SnowlineError),

    #[error("Layer {layer} has {actual} cells, expected {expected}")]
    LayerShape {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported axis order: {0}")]
    AxisOrder(String),

    #[error("Observation {0} is not on the internal lattice")]
    NotOnLattice(String),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
