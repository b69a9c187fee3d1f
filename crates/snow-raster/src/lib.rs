//! Snow-cover raster engine.
//!
//! This crate holds the analysis core of snowline: a fixed-resolution
//! geographic lattice, a ternary snow-state raster with cluster-based
//! denoising, a marching-squares boundary tracer and the temporal merge
//! model that carries the raster across update runs.
//!
//! # Architecture
//!
//! ```text
//! classified observation (any lat/lon lattice)
//!      │
//!      ▼
//! GeoGrid::resample_to_grid ──► SnowRaster (internal lattice)
//!                                    │
//!                                    ▼
//!                TemporalSnowMap::update(raster, timestamp)
//!                                    │
//!                                    ├─► filter_size_snow / filter_size_nonsnow
//!                                    │
//!                                    ▼
//!                            get_boundaries() ──► Vec<ClusterBoundary>
//!                                    │
//!                                    ▼
//!                    GeoGrid::boundaries_to_geo ──► GeoJSON
//! ```
//!
//! # Example
//!
//! ```
//! use snow_raster::{GeoGrid, GridConfig, SnowClass, SnowRaster, TemporalSnowMap};
//! use snowline_common::BoundingBox;
//!
//! let config = GridConfig {
//!     bbox: BoundingBox::new(0.0, 0.0, 5.0, 5.0),
//!     resolution_m: 1.0,
//!     meters_per_degree_x: 1.0,
//!     meters_per_degree_y: 1.0,
//! };
//! let grid = GeoGrid::new(config).unwrap();
//! let mut state = TemporalSnowMap::blank(&grid);
//!
//! let mut cells = vec![SnowClass::NoSnow; 25];
//! cells[2 * 5 + 2] = SnowClass::Snow;
//! let observation = SnowRaster::new(5, 5, cells, true).unwrap();
//!
//! let ts = chrono::DateTime::from_timestamp(1_600_000_000, 0).unwrap();
//! state.update(&observation, ts).unwrap();
//! assert_eq!(state.get_num_clusters(), 1);
//! ```

pub mod boundary;
pub mod class;
pub mod cluster;
pub mod config;
pub mod contour;
pub mod grid;
pub mod interpolation;
pub mod raster;
pub mod temporal;

// Re-export commonly used types at crate root
pub use boundary::{ClusterBoundary, Ring};
pub use class::SnowClass;
pub use cluster::{label_clusters, Labeling};
pub use config::GridConfig;
pub use contour::Point;
pub use grid::GeoGrid;
pub use raster::{FilterSummary, SnowRaster, StateCounts};
pub use temporal::TemporalSnowMap;
