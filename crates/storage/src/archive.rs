//! Snow raster archives.
//!
//! An archive is a gzip-compressed tar file with exactly two entries:
//!
//! | entry             | content                                              |
//! |-------------------|------------------------------------------------------|
//! | `array.npy`       | the raster as a `|i1` NumPy array, shape `(rows, cols)` |
//! | `attributes.json` | `{"is_internal": bool, "timestamp": seconds \| null}` |
//!
//! The same container carries the persisted temporal state between update
//! runs and individual classified observations.

use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use snow_raster::{SnowRaster, TemporalSnowMap};
use snowline_common::{timestamp_from_unix, timestamp_to_unix, SnowlineError, SnowlineResult};

use crate::npy;

/// Name of the array entry inside an archive.
pub const ARRAY_ENTRY: &str = "array.npy";

/// Name of the attribute entry inside an archive.
pub const ATTRIBUTES_ENTRY: &str = "attributes.json";

/// Upper bound on the buffer reserved up front for one archive entry.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Metadata stored next to the array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchiveAttributes {
    pub is_internal: bool,
    /// Unix seconds of the last merged observation.
    pub timestamp: Option<f64>,
}

/// A raster plus the timestamp it is valid for.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterArchive {
    pub raster: SnowRaster,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RasterArchive {
    pub fn new(raster: SnowRaster, timestamp: Option<DateTime<Utc>>) -> Self {
        Self { raster, timestamp }
    }

    /// Snapshot a temporal state.
    pub fn from_state(state: &TemporalSnowMap) -> Self {
        Self::new(state.raster().clone(), state.get_timestamp())
    }

    /// Turn the archive back into a temporal state.
    pub fn into_state(self) -> TemporalSnowMap {
        TemporalSnowMap::new(self.raster, self.timestamp)
    }

    pub fn attributes(&self) -> ArchiveAttributes {
        ArchiveAttributes {
            is_internal: self.raster.is_internal(),
            timestamp: self.timestamp.as_ref().map(timestamp_to_unix),
        }
    }

    /// Serialize to the compressed container format.
    pub fn to_bytes(&self) -> SnowlineResult<Vec<u8>> {
        let array = npy::write_i8(self.raster.shape(), &self.raster.to_raw())?;
        let attributes = serde_json::to_vec(&self.attributes())?;

        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        append_entry(&mut builder, ARRAY_ENTRY, &array)?;
        append_entry(&mut builder, ATTRIBUTES_ENTRY, &attributes)?;

        let encoder = builder.into_inner()?;
        Ok(encoder.finish()?)
    }

    /// Parse the compressed container format.
    ///
    /// Fails without returning partial data if either entry is missing or
    /// malformed.
    pub fn from_bytes(bytes: &[u8]) -> SnowlineResult<Self> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        let mut array_bytes: Option<Vec<u8>> = None;
        let mut attribute_bytes: Option<Vec<u8>> = None;

        let entries = archive.entries().map_err(not_an_archive)?;
        for entry in entries {
            let mut entry = entry.map_err(not_an_archive)?;
            let name = entry
                .path()
                .map_err(not_an_archive)?
                .to_string_lossy()
                .trim_start_matches("./")
                .to_string();

            let slot = match name.as_str() {
                ARRAY_ENTRY => &mut array_bytes,
                ATTRIBUTES_ENTRY => &mut attribute_bytes,
                _ => {
                    tracing::debug!(entry = %name, "Ignoring unknown archive entry");
                    continue;
                }
            };

            // Entry sizes come from an untrusted header
            let mut buf = Vec::with_capacity(entry.size().min(MAX_PREALLOCATION) as usize);
            entry.read_to_end(&mut buf).map_err(not_an_archive)?;
            *slot = Some(buf);
        }

        let array_bytes = array_bytes
            .ok_or_else(|| SnowlineError::structural(format!("missing {} entry", ARRAY_ENTRY)))?;
        let attribute_bytes = attribute_bytes.ok_or_else(|| {
            SnowlineError::structural(format!("missing {} entry", ATTRIBUTES_ENTRY))
        })?;

        let attributes: ArchiveAttributes = serde_json::from_slice(&attribute_bytes)
            .map_err(|e| SnowlineError::structural(format!("{}: {}", ATTRIBUTES_ENTRY, e)))?;

        let array = npy::read(&array_bytes)?;
        let (rows, cols) = array.shape_2d()?;
        let raster = SnowRaster::from_codes(cols, rows, array.values, attributes.is_internal)?;
        let timestamp = attributes.timestamp.map(timestamp_from_unix).transpose()?;

        Ok(Self { raster, timestamp })
    }

    /// Write the archive to `path`.
    ///
    /// The bytes go to a temporary file in the target directory which is
    /// then renamed over `path`, so readers never see a partial archive.
    /// Returns the archive size in bytes.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SnowlineResult<u64> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes)?;

        tracing::info!(
            path = %path.display(),
            bytes = bytes.len(),
            timestamp = ?self.timestamp,
            "Saved raster archive"
        );

        Ok(bytes.len() as u64)
    }

    /// Read an archive from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> SnowlineResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let archive = Self::from_bytes(&bytes)?;

        tracing::info!(
            path = %path.display(),
            rows = archive.raster.height(),
            cols = archive.raster.width(),
            is_internal = archive.raster.is_internal(),
            "Loaded raster archive"
        );

        Ok(archive)
    }
}

/// Persist a temporal state to `path`.
pub fn save_state<P: AsRef<Path>>(state: &TemporalSnowMap, path: P) -> SnowlineResult<u64> {
    RasterArchive::from_state(state).save(path)
}

/// Load a temporal state from `path`.
pub fn load_state<P: AsRef<Path>>(path: P) -> SnowlineResult<TemporalSnowMap> {
    Ok(RasterArchive::load(path)?.into_state())
}

/// Write `bytes` to a temporary sibling of `path`, then rename it into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> SnowlineResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SnowlineError::from(e.error))?;
    Ok(())
}

fn append_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    data: &[u8],
) -> SnowlineResult<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, data)?;
    Ok(())
}

fn not_an_archive(err: std::io::Error) -> SnowlineError {
    SnowlineError::structural(format!("not a gzip-compressed tar archive: {}", err))
}
