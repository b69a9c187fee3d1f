//! Snow state update job.
//!
//! Loads the persisted snow state, merges every newer observation, saves
//! the result and publishes the boundaries of the remaining snow clusters.

pub mod pipeline;

pub use pipeline::{UpdateOptions, UpdatePipeline, UpdateSummary};
