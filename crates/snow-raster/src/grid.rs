//! The fixed-resolution equirectangular lattice.
//!
//! Rows run south to north (row 0 is the lower-left latitude), columns run
//! west to east. Pixel coordinates follow the `(x = column, y = row)`
//! convention used by the boundary tracer.

use snowline_common::{SnowlineError, SnowlineResult};

use crate::boundary::{ClusterBoundary, Ring};
use crate::class::SnowClass;
use crate::config::GridConfig;
use crate::contour::Point;
use crate::interpolation::{linspace, nearest_interpolate};
use crate::raster::SnowRaster;

/// Immutable lattice derived from a [`GridConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeoGrid {
    config: GridConfig,
    width: usize,
    height: usize,
    /// Degrees per lattice step, `(lon, lat)`.
    transform: (f64, f64),
}

impl GeoGrid {
    /// Derive lattice dimensions and the pixel → geo transform.
    pub fn new(config: GridConfig) -> SnowlineResult<Self> {
        config.validate()?;

        let bbox = &config.bbox;
        let width = (bbox.width() * config.meters_per_degree_x / config.resolution_m).round();
        let height = (bbox.height() * config.meters_per_degree_y / config.resolution_m).round();

        if width < 1.0 || height < 1.0 || !width.is_finite() || !height.is_finite() {
            return Err(SnowlineError::Config(format!(
                "lattice of {}x{} cells is empty",
                height, width
            )));
        }

        let width = width as usize;
        let height = height as usize;
        let transform = (bbox.width() / width as f64, bbox.height() / height as f64);

        tracing::debug!(
            width = width,
            height = height,
            dx = transform.0,
            dy = transform.1,
            "Constructed lattice"
        );

        Ok(Self {
            config,
            width,
            height,
            transform,
        })
    }

    /// The configuration this lattice was built from.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(rows, cols)` of every raster on this lattice.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Degrees per lattice step as `(lon, lat)`.
    pub fn transform(&self) -> (f64, f64) {
        self.transform
    }

    /// Lower-left corner `(lon, lat)`; the geographic position of pixel (0, 0).
    pub fn origin(&self) -> (f64, f64) {
        self.config.bbox.lower_left()
    }

    /// A lattice-shaped row-major array filled with [`SnowClass::Unknown`].
    pub fn zeros(&self) -> Vec<SnowClass> {
        vec![SnowClass::Unknown; self.width * self.height]
    }

    /// An all-unknown raster flagged as internal.
    pub fn blank_raster(&self) -> SnowRaster {
        SnowRaster::filled(self.width, self.height, SnowClass::Unknown, true)
    }

    /// Longitudes of the lattice columns.
    pub fn axis_x(&self) -> Vec<f64> {
        linspace(self.config.bbox.min_x, self.config.bbox.max_x, self.width)
    }

    /// Latitudes of the lattice rows.
    pub fn axis_y(&self) -> Vec<f64> {
        linspace(self.config.bbox.min_y, self.config.bbox.max_y, self.height)
    }

    /// Resample a row-major array on another lat/lon lattice onto this one.
    ///
    /// `source` has `axis_x.len()` columns (longitudes) and `axis_y.len()`
    /// rows (latitudes); both axes must be strictly increasing. Lattice
    /// points outside the source coverage receive `fill_value`.
    pub fn resample_to_grid<T: Copy>(
        &self,
        source: &[T],
        axis_x: &[f64],
        axis_y: &[f64],
        fill_value: T,
    ) -> SnowlineResult<Vec<T>> {
        if source.len() != axis_x.len() * axis_y.len() {
            return Err(SnowlineError::ShapeMismatch {
                expected: format!("{}x{}", axis_y.len(), axis_x.len()),
                actual: format!("{} cells", source.len()),
            });
        }

        let target_x = self.axis_x();
        let target_y = self.axis_y();

        let mut output = Vec::with_capacity(self.width * self.height);
        for &y in &target_y {
            for &x in &target_x {
                let value = nearest_interpolate(source, axis_x, axis_y, x, y).unwrap_or(fill_value);
                output.push(value);
            }
        }

        Ok(output)
    }

    /// Resample a classified raster on a native lattice onto this one.
    ///
    /// Uncovered lattice points become [`SnowClass::Unknown`].
    pub fn resample_raster(
        &self,
        raster: &SnowRaster,
        axis_x: &[f64],
        axis_y: &[f64],
    ) -> SnowlineResult<SnowRaster> {
        if raster.is_internal() {
            return Err(SnowlineError::Compatibility(
                "raster is already on the internal lattice".to_string(),
            ));
        }
        if raster.shape() != (axis_y.len(), axis_x.len()) {
            return Err(SnowlineError::shape_mismatch(
                (axis_y.len(), axis_x.len()),
                raster.shape(),
            ));
        }

        let cells = self.resample_to_grid(raster.cells(), axis_x, axis_y, SnowClass::Unknown)?;
        SnowRaster::new(self.width, self.height, cells, true)
    }

    /// Map a pixel-space point to `(lon, lat)`.
    pub fn pixel_to_geo(&self, point: Point) -> [f64; 2] {
        let (x0, y0) = self.origin();
        [
            point.x * self.transform.0 + x0,
            point.y * self.transform.1 + y0,
        ]
    }

    /// Map every vertex of a pixel-space ring to `(lon, lat)`.
    pub fn pixel_ring_to_geo(&self, ring: &Ring) -> Vec<[f64; 2]> {
        ring.points().iter().map(|p| self.pixel_to_geo(*p)).collect()
    }

    /// Map every cluster boundary to geographic rings, keeping group structure.
    pub fn boundaries_to_geo(&self, boundaries: &[ClusterBoundary]) -> Vec<Vec<Vec<[f64; 2]>>> {
        boundaries
            .iter()
            .map(|b| b.rings.iter().map(|r| self.pixel_ring_to_geo(r)).collect())
            .collect()
    }
}
