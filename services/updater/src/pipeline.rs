//! The update run: state → merge → save → filter → trace → publish.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use ingestion::{load_observation, merge_observations, IngestionError, MergeReport};
use snow_raster::{GeoGrid, TemporalSnowMap};
use snowline_common::FeatureCollection;
use storage::{load_state, save_state, PublishConfig, PublishOutcome, Publisher};

/// Options of one update run.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Persisted state to start from.
    pub state_map: Option<PathBuf>,
    /// Where to store the merged state; not stored if unset.
    pub new_state_map: Option<PathBuf>,
    /// Observation archives to consider.
    pub observations: Vec<PathBuf>,
    /// Start from a blank state if `state_map` is unset or unreadable.
    pub allow_blank: bool,
    /// Remove snow clusters below this many pixels (0 disables).
    pub size_filter_snow: usize,
    /// Remove no-snow clusters below this many pixels (0 disables).
    pub size_filter_nonsnow: usize,
    /// Let unknown cells join clusters in both filters.
    pub include_unknown: bool,
    /// Stop after merging and saving.
    pub no_boundaries: bool,
    /// Compute boundaries but do not publish.
    pub no_upload: bool,
    /// Publish without writing anything.
    pub dry_run: bool,
    /// Drop previous catalog records before publishing.
    pub wipe_previous: bool,
    /// Directory receiving artifacts and the catalog.
    pub publish_dir: PathBuf,
    /// Drop collinear boundary vertices with this tolerance in pixels.
    pub simplify: Option<f64>,
}

/// What an update run did.
#[derive(Debug, Clone, Default)]
pub struct UpdateSummary {
    pub merge: MergeReport,
    pub saved_state: Option<PathBuf>,
    /// Number of published polygons, if boundaries were computed.
    pub boundaries: Option<usize>,
    pub published: Option<PublishOutcome>,
}

/// Runs update jobs on a fixed lattice.
pub struct UpdatePipeline {
    grid: GeoGrid,
    publish: PublishConfig,
    options: UpdateOptions,
}

impl UpdatePipeline {
    pub fn new(grid: GeoGrid, publish: PublishConfig, options: UpdateOptions) -> Self {
        Self {
            grid,
            publish,
            options,
        }
    }

    /// Load the persisted state, or start blank when allowed.
    ///
    /// Only a missing state map falls back to a blank one; a state map that
    /// exists but cannot be decoded is always an error.
    pub fn load_state(&self) -> Result<TemporalSnowMap> {
        let path = match &self.options.state_map {
            Some(path) if path.exists() => path,
            missing if self.options.allow_blank => {
                warn!(path = ?missing, "No state map found, starting from a blank one");
                return Ok(TemporalSnowMap::blank(&self.grid));
            }
            Some(path) => bail!("state map {} does not exist", path.display()),
            None => bail!("no state map given"),
        };

        let state = load_state(path)
            .with_context(|| format!("failed to read state map {}", path.display()))?;

        if state.raster().shape() != self.grid.shape() {
            bail!(
                "state map has shape {:?}, lattice is {:?}",
                state.raster().shape(),
                self.grid.shape()
            );
        }

        info!(timestamp = ?state.get_timestamp(), "Loaded state map");
        Ok(state)
    }

    fn load_observations(&self) -> Result<Vec<ingestion::Observation>> {
        let mut observations = Vec::with_capacity(self.options.observations.len());
        for path in &self.options.observations {
            match load_observation(path) {
                Ok(observation) => observations.push(observation),
                Err(IngestionError::NotOnLattice(p)) => {
                    warn!(path = %p, "Skipping observation that is not on the lattice");
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to read observation {}", path.display()))
                }
            }
        }
        Ok(observations)
    }

    /// Execute the run; `now` names the published artifact.
    pub fn run(&self, now: DateTime<Utc>) -> Result<UpdateSummary> {
        let mut state = self.load_state()?;
        let observations = self.load_observations()?;

        let mut summary = UpdateSummary {
            merge: merge_observations(&mut state, observations)?,
            ..UpdateSummary::default()
        };

        let counts = state.counts();
        info!(
            snow = counts.snow,
            no_snow = counts.no_snow,
            unknown = counts.unknown,
            merged = summary.merge.merged.len(),
            "Update complete"
        );

        if let Some(path) = &self.options.new_state_map {
            save_state(&state, path)
                .with_context(|| format!("failed to write state map {}", path.display()))?;
            summary.saved_state = Some(path.clone());
        }

        if !summary.merge.updated() {
            info!("No new observations, nothing to publish");
            return Ok(summary);
        }
        if self.options.no_boundaries {
            return Ok(summary);
        }

        let collection = self.boundaries(&mut state);
        summary.boundaries = Some(collection.features.len());

        if self.options.no_upload {
            return Ok(summary);
        }

        let publisher = Publisher::new(&self.options.publish_dir, self.publish.clone())
            .with_dry_run(self.options.dry_run);
        summary.published = Some(publisher.publish(&collection, now, self.options.wipe_previous)?);

        Ok(summary)
    }

    /// Filter the state and trace its snow boundaries in geographic space.
    fn boundaries(&self, state: &mut TemporalSnowMap) -> FeatureCollection {
        if self.options.size_filter_snow > 0 {
            state.filter_size_snow(self.options.size_filter_snow, self.options.include_unknown);
        }
        if self.options.size_filter_nonsnow > 0 {
            state.filter_size_nonsnow(self.options.size_filter_nonsnow, self.options.include_unknown);
        }

        let mut boundaries = state.get_boundaries();
        if let Some(deviation) = self.options.simplify {
            boundaries = boundaries.iter().map(|b| b.simplified(deviation)).collect();
        }

        info!(
            clusters = boundaries.len(),
            vertices = boundaries
                .iter()
                .flat_map(|b| &b.rings)
                .map(|r| r.len())
                .sum::<usize>(),
            "Calculated boundaries"
        );

        FeatureCollection::from_polygons(&self.grid.boundaries_to_geo(&boundaries))
    }
}
