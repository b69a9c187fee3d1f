//! Stored observations and their merge into the temporal state.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use snow_raster::{SnowRaster, TemporalSnowMap};
use snowline_common::timestamp_from_filename;
use storage::RasterArchive;

use crate::error::{IngestionError, Result};

/// A classified observation ready to be merged.
#[derive(Debug, Clone)]
pub struct Observation {
    pub path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub raster: SnowRaster,
}

/// Outcome of merging a batch of observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Observations merged, oldest first.
    pub merged: Vec<PathBuf>,
    /// Observations not newer than the state.
    pub skipped_stale: Vec<PathBuf>,
    /// Timestamp of the state after the merge.
    pub timestamp: Option<DateTime<Utc>>,
}

impl MergeReport {
    /// True if at least one observation changed the state.
    pub fn updated(&self) -> bool {
        !self.merged.is_empty()
    }
}

/// Load an observation archive.
///
/// The acquisition time comes from the archive attributes, or from the
/// `_YYYYMMDDTHHMMSS_` part of the file name if the attributes carry none.
/// Observations must already be resampled onto the internal lattice.
pub fn load_observation<P: AsRef<Path>>(path: P) -> Result<Observation> {
    let path = path.as_ref();
    let archive = RasterArchive::load(path)?;

    if !archive.raster.is_internal() {
        return Err(IngestionError::NotOnLattice(path.display().to_string()));
    }

    let timestamp = match archive.timestamp {
        Some(ts) => ts,
        None => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            timestamp_from_filename(&name)?
        }
    };

    Ok(Observation {
        path: path.to_path_buf(),
        timestamp,
        raster: archive.raster,
    })
}

/// Keep the observations newer than `state`, sorted oldest first.
///
/// Returns `(newer, stale)`.
pub fn select_newer(
    observations: Vec<Observation>,
    state: &TemporalSnowMap,
) -> (Vec<Observation>, Vec<Observation>) {
    let (mut newer, stale): (Vec<_>, Vec<_>) = observations
        .into_iter()
        .partition(|o| state.is_newer(o.timestamp));
    newer.sort_by_key(|o| o.timestamp);
    (newer, stale)
}

/// Merge every observation newer than `state` into it, oldest first.
///
/// Stops at the first observation that cannot be merged; the state then
/// holds every observation merged before it.
pub fn merge_observations(
    state: &mut TemporalSnowMap,
    observations: Vec<Observation>,
) -> Result<MergeReport> {
    let total = observations.len();
    let (newer, stale) = select_newer(observations, state);

    tracing::info!(
        total = total,
        newer = newer.len(),
        state_timestamp = ?state.get_timestamp(),
        "Selected observations"
    );

    let mut report = MergeReport {
        skipped_stale: stale.into_iter().map(|o| o.path).collect(),
        ..MergeReport::default()
    };

    for observation in newer {
        state.update(&observation.raster, observation.timestamp)?;
        tracing::info!(
            path = %observation.path.display(),
            timestamp = %observation.timestamp,
            "Merged observation"
        );
        report.merged.push(observation.path);
    }

    report.timestamp = state.get_timestamp();
    Ok(report)
}
