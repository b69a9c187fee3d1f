//! Common types and utilities shared across the snowline crates.

pub mod bbox;
pub mod error;
pub mod geojson;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{SnowlineError, SnowlineResult};
pub use geojson::{Feature, FeatureCollection, Geometry, COORDINATE_PRECISION};
pub use time::{timestamp_from_filename, timestamp_from_unix, timestamp_to_unix};
