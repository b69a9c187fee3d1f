//! Configuration for the internal lattice.

use std::path::Path;

use serde::{Deserialize, Serialize};
use snowline_common::{BoundingBox, SnowlineError, SnowlineResult};

/// One degree east is roughly 76 km at alpine latitudes.
pub const DEFAULT_METERS_PER_DEGREE_X: f64 = 76e3;

/// One degree north is roughly 111 km.
pub const DEFAULT_METERS_PER_DEGREE_Y: f64 = 111e3;

/// Default distance between neighbouring lattice points, in meters.
pub const DEFAULT_RESOLUTION_M: f64 = 300.0;

/// Configuration of the equirectangular lattice all rasters are merged on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Covered region in WGS84 degrees.
    pub bbox: BoundingBox,

    /// Ground distance between neighbouring lattice points in meters.
    pub resolution_m: f64,

    /// Meters per degree of longitude used to size the lattice.
    pub meters_per_degree_x: f64,

    /// Meters per degree of latitude used to size the lattice.
    pub meters_per_degree_y: f64,
}

impl Default for GridConfig {
    /// Switzerland lies between 45.8 and 47.8N and between 5.9 and 10.5E;
    /// the default box adds a small margin around it.
    fn default() -> Self {
        Self {
            bbox: BoundingBox::from_corners((5.7, 45.7), (10.7, 47.9)),
            resolution_m: DEFAULT_RESOLUTION_M,
            meters_per_degree_x: DEFAULT_METERS_PER_DEGREE_X,
            meters_per_degree_y: DEFAULT_METERS_PER_DEGREE_Y,
        }
    }
}

impl GridConfig {
    /// Load configuration from environment variables on top of the defaults.
    ///
    /// - `SNOWLINE_GRID_BBOX`: "minx,miny,maxx,maxy"
    /// - `SNOWLINE_GRID_RESOLUTION_M`: resolution in meters
    pub fn from_env() -> SnowlineResult<Self> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SNOWLINE_GRID_BBOX") {
            config.bbox = BoundingBox::from_csv(&val)
                .map_err(|e| SnowlineError::Config(e.to_string()))?;
        }

        if let Ok(val) = std::env::var("SNOWLINE_GRID_RESOLUTION_M") {
            config.resolution_m = val.parse().map_err(|_| {
                SnowlineError::Config(format!("SNOWLINE_GRID_RESOLUTION_M={} is not a number", val))
            })?;
        }

        Ok(config)
    }

    /// Load configuration from a YAML file. Missing keys fall back to the defaults.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> SnowlineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&text)
            .map_err(|e| SnowlineError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SnowlineResult<()> {
        if !(self.resolution_m.is_finite() && self.resolution_m > 0.0) {
            return Err(SnowlineError::Config(format!(
                "resolution must be > 0, got {}",
                self.resolution_m
            )));
        }

        if !(self.meters_per_degree_x > 0.0 && self.meters_per_degree_y > 0.0) {
            return Err(SnowlineError::Config(
                "meters per degree must be > 0".to_string(),
            ));
        }

        if self.bbox.is_degenerate() {
            return Err(SnowlineError::Config(format!(
                "degenerate bounding box {:?}",
                self.bbox
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GridConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_resolution() {
        for resolution_m in [0.0, -300.0, f64::NAN] {
            let config = GridConfig {
                resolution_m,
                ..GridConfig::default()
            };
            assert!(matches!(config.validate(), Err(SnowlineError::Config(_))));
        }
    }

    #[test]
    fn test_degenerate_bbox() {
        use test_utils::bbox::{INVALID, POINT};

        for (min_x, min_y, max_x, max_y) in [(5.0, 45.0, 5.0, 47.0), POINT, INVALID] {
            let config = GridConfig {
                bbox: BoundingBox::new(min_x, min_y, max_x, max_y),
                ..GridConfig::default()
            };
            assert!(matches!(config.validate(), Err(SnowlineError::Config(_))));
        }
    }

    #[test]
    fn test_from_yaml_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.yaml");
        std::fs::write(
            &path,
            "bbox:\n  min_x: 0.0\n  min_y: 0.0\n  max_x: 1.0\n  max_y: 2.0\nresolution_m: 1000.0\n",
        )
        .unwrap();

        let config = GridConfig::from_yaml(&path).unwrap();
        assert_eq!(config.bbox, BoundingBox::new(0.0, 0.0, 1.0, 2.0));
        assert_eq!(config.resolution_m, 1000.0);
        assert_eq!(config.meters_per_degree_x, DEFAULT_METERS_PER_DEGREE_X);
    }

    #[test]
    fn test_from_yaml_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.yaml");
        std::fs::write(&path, "resolution_m: [not, a, number]\n").unwrap();
        assert!(matches!(
            GridConfig::from_yaml(&path),
            Err(SnowlineError::Config(_))
        ));
    }
}
