//! Publication of boundary artifacts to a local directory.
//!
//! Each run writes one GeoJSON artifact named after the publication time
//! and appends a record to the catalog file next to it. Syncing the
//! directory to a web bucket is left to deployment tooling.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snowline_common::{FeatureCollection, SnowlineResult};

use crate::archive::write_atomic;
use crate::catalog::SnowlineCatalog;

const ARTIFACT_DATETIME_FORMAT: &str = "%Y%m%d_%H%M";

/// File name of the artifact published at `datetime`.
pub fn artifact_name(datetime: &DateTime<Utc>) -> String {
    format!("snowline_{}.json", datetime.format(ARTIFACT_DATETIME_FORMAT))
}

/// Publication settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Bucket name recorded in the catalog envelope.
    pub bucket: String,
    /// File name of the catalog inside the publish directory.
    pub catalog_name: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            bucket: "snowlines".to_string(),
            catalog_name: "snowline.json".to_string(),
        }
    }
}

/// What a publish call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    pub artifact_path: PathBuf,
    pub catalog_path: PathBuf,
    pub record_id: u64,
    pub features: usize,
    /// False for dry runs.
    pub written: bool,
}

/// Writes artifacts and maintains the catalog in a directory.
#[derive(Debug, Clone)]
pub struct Publisher {
    root: PathBuf,
    config: PublishConfig,
    dry_run: bool,
}

impl Publisher {
    pub fn new(root: impl Into<PathBuf>, config: PublishConfig) -> Self {
        Self {
            root: root.into(),
            config,
            dry_run: false,
        }
    }

    /// Compute everything but write nothing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(&self.config.catalog_name)
    }

    /// Load the current catalog, or an empty one.
    pub fn catalog(&self) -> SnowlineResult<SnowlineCatalog> {
        SnowlineCatalog::load_or_new(self.catalog_path(), &self.config.bucket)
    }

    /// Publish `collection` as the artifact for `now`.
    ///
    /// With `wipe_previous` the catalog forgets all earlier records before
    /// the new one is appended. Artifact and catalog are each replaced
    /// atomically.
    pub fn publish(
        &self,
        collection: &FeatureCollection,
        now: DateTime<Utc>,
        wipe_previous: bool,
    ) -> SnowlineResult<PublishOutcome> {
        let name = artifact_name(&now);
        let artifact_path = self.root.join(&name);
        let catalog_path = self.catalog_path();

        let mut catalog = self.catalog()?;
        if wipe_previous {
            let removed = catalog.wipe();
            tracing::info!(removed = removed, "Wiped previous catalog records");
        }
        let record_id = catalog.append(name.clone(), now).id;

        let outcome = PublishOutcome {
            artifact_path,
            catalog_path,
            record_id,
            features: collection.features.len(),
            written: !self.dry_run,
        };

        if self.dry_run {
            tracing::info!(
                artifact = %name,
                record_id = record_id,
                features = outcome.features,
                "Dry run, nothing written"
            );
            return Ok(outcome);
        }

        write_atomic(&outcome.artifact_path, &serde_json::to_vec(collection)?)?;
        write_atomic(&outcome.catalog_path, catalog.to_json()?.as_bytes())?;

        tracing::info!(
            artifact = %outcome.artifact_path.display(),
            catalog = %outcome.catalog_path.display(),
            record_id = record_id,
            features = outcome.features,
            "Published snowline"
        );

        Ok(outcome)
    }
}
