//! Persistence and publication for snowline.
//!
//! Provides:
//! - NumPy `.npy` encoding of rasters ([`npy`])
//! - gzip-compressed tar archives holding a raster plus its attributes ([`archive`])
//! - the JSON catalog listing published boundary artifacts ([`catalog`])
//! - a local-directory publisher writing artifacts and the catalog ([`publish`])

pub mod archive;
pub mod catalog;
pub mod npy;
pub mod publish;

pub use archive::{load_state, save_state, ArchiveAttributes, RasterArchive};
pub use catalog::{CatalogRecord, SnowlineCatalog};
pub use npy::{NpyArray, NpyDtype};
pub use publish::{artifact_name, PublishConfig, PublishOutcome, Publisher};
