//! Catalog of published boundary artifacts.
//!
//! The catalog is a single JSON document read by the map front end:
//!
//! ```json
//! {"version": "1.0", "bucket": "snowlines", "updated": 1576316135,
//!  "data": [{"id": 1, "datetime": 1576316135, "url": "snowline_20191214_0935.json"}]}
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snowline_common::SnowlineResult;

/// Current catalog format version.
pub const CATALOG_VERSION: &str = "1.0";

/// One published artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: u64,
    /// Unix seconds of publication.
    pub datetime: i64,
    /// Artifact file name relative to the bucket.
    pub url: String,
}

/// The catalog envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowlineCatalog {
    pub version: String,
    pub bucket: String,
    /// Unix seconds of the last append.
    pub updated: i64,
    pub data: Vec<CatalogRecord>,
}

impl SnowlineCatalog {
    /// An empty catalog for `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            version: CATALOG_VERSION.to_string(),
            bucket: bucket.into(),
            updated: 0,
            data: Vec::new(),
        }
    }

    /// Id the next appended record will receive.
    pub fn next_id(&self) -> u64 {
        self.data.iter().map(|r| r.id).max().map_or(1, |max| max + 1)
    }

    /// Record a newly published artifact and bump `updated`.
    pub fn append(&mut self, url: impl Into<String>, datetime: DateTime<Utc>) -> &CatalogRecord {
        let record = CatalogRecord {
            id: self.next_id(),
            datetime: datetime.timestamp(),
            url: url.into(),
        };
        self.updated = record.datetime;
        self.data.push(record);
        &self.data[self.data.len() - 1]
    }

    /// Forget every previously published record.
    pub fn wipe(&mut self) -> usize {
        let removed = self.data.len();
        self.data.clear();
        removed
    }

    /// The most recently appended record.
    pub fn latest(&self) -> Option<&CatalogRecord> {
        self.data.iter().max_by_key(|r| r.id)
    }

    pub fn to_json(&self) -> SnowlineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> SnowlineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a catalog file.
    pub fn load<P: AsRef<Path>>(path: P) -> SnowlineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Load a catalog file, or start an empty one if it does not exist.
    pub fn load_or_new<P: AsRef<Path>>(path: P, bucket: &str) -> SnowlineResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "No catalog found, starting a new one");
            Ok(Self::new(bucket))
        }
    }
}
