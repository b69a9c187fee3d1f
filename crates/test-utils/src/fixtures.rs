//! Common test fixtures for snowline tests.

use std::path::PathBuf;

use tempfile::TempDir;

/// Common bounding box definitions as `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Default coverage of the Swiss Alps
    pub const SWISS_ALPS: (f64, f64, f64, f64) = (5.7, 45.7, 10.7, 47.9);

    /// Unit lattice used together with one-metre-per-degree scaling
    pub const UNIT_5X5: (f64, f64, f64, f64) = (0.0, 0.0, 5.0, 5.0);

    /// Zero-area box
    pub const POINT: (f64, f64, f64, f64) = (8.0, 46.0, 8.0, 46.0);

    /// Invalid bbox (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// Expected lattice dimensions for fixture boxes.
pub mod lattice {
    /// `(width, height)` of [`super::bbox::SWISS_ALPS`] at 300 m.
    pub const SWISS_ALPS_300M: (usize, usize) = (1267, 814);
}

/// Sample observation file names as delivered by the classification feed.
pub mod filenames {
    pub const WITH_TIMESTAMP: &str = "S2B_MSIL2A_20191214T093535_N0213_R136_T32TLS.tar.gz";
    /// Unix seconds of [`WITH_TIMESTAMP`].
    pub const WITH_TIMESTAMP_UNIX: i64 = 1_576_316_135;
    pub const WITHOUT_TIMESTAMP: &str = "observation.tar.gz";
}

/// A scratch directory that is removed when dropped.
pub fn scratch_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("snowline-test-")
        .tempdir()
        .expect("failed to create scratch directory")
}

/// Path of `name` inside `dir`.
pub fn scratch_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}
