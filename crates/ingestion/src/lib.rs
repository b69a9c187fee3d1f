//! Observation ingestion for snowline.
//!
//! Turns per-pixel classification flags into ternary snow rasters on the
//! internal lattice and merges stored observations into the temporal
//! state in acquisition order.
//!
//! # Architecture
//!
//! ```text
//! flag masks + lon/lat axes ──► ClassificationLayers::to_raster ──► SnowRaster
//!                                                                      │
//! observation archives ──► load_observation ──► select_newer ──► merge_observations
//!                                                                      │
//!                                                                      ▼
//!                                                              TemporalSnowMap
//! ```

pub mod classification;
pub mod error;
pub mod observation;

// Re-exports
pub use classification::{AxisOrientation, ClassificationLayers};
pub use error::{IngestionError, Result};
pub use observation::{load_observation, merge_observations, select_newer, MergeReport, Observation};
