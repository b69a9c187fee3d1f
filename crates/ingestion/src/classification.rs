//! Classification flags to ternary snow raster.
//!
//! Satellite snow products ship boolean pixel flags (snow/ice, cloud,
//! cloud buffer, invalid) on a regular lat/lon lattice. A pixel becomes
//! - snow when flagged snow, regardless of the other flags,
//! - unknown when flagged cloud, cloud buffer or invalid,
//! - no snow otherwise.
//!
//! All masks are row-major with one row per latitude and one column per
//! longitude.

use snow_raster::{GeoGrid, SnowClass, SnowRaster};

use crate::error::{IngestionError, Result};

/// How the latitude axis was ordered before normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrientation {
    /// Latitudes were already ascending.
    Ascending,
    /// Latitudes were descending; axis and mask rows were reversed.
    Flipped,
}

/// Flag masks of one observation plus its coordinate axes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationLayers {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub snow: Vec<bool>,
    pub cloud: Vec<bool>,
    pub cloud_buffer: Option<Vec<bool>>,
    pub invalid: Option<Vec<bool>>,
}

impl ClassificationLayers {
    /// Create layers from the two required masks.
    pub fn new(lon: Vec<f64>, lat: Vec<f64>, snow: Vec<bool>, cloud: Vec<bool>) -> Result<Self> {
        let layers = Self {
            lon,
            lat,
            snow,
            cloud,
            cloud_buffer: None,
            invalid: None,
        };
        layers.check_shapes()?;
        Ok(layers)
    }

    pub fn with_cloud_buffer(mut self, mask: Vec<bool>) -> Result<Self> {
        self.cloud_buffer = Some(mask);
        self.check_shapes()?;
        Ok(self)
    }

    pub fn with_invalid(mut self, mask: Vec<bool>) -> Result<Self> {
        self.invalid = Some(mask);
        self.check_shapes()?;
        Ok(self)
    }

    /// Number of columns (longitudes).
    pub fn width(&self) -> usize {
        self.lon.len()
    }

    /// Number of rows (latitudes).
    pub fn height(&self) -> usize {
        self.lat.len()
    }

    fn masks(&self) -> impl Iterator<Item = (&'static str, &Vec<bool>)> {
        [
            ("snow", Some(&self.snow)),
            ("cloud", Some(&self.cloud)),
            ("cloud_buffer", self.cloud_buffer.as_ref()),
            ("invalid", self.invalid.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, mask)| mask.map(|m| (name, m)))
    }

    fn check_shapes(&self) -> Result<()> {
        let expected = self.width() * self.height();
        for (layer, mask) in self.masks() {
            if mask.len() != expected {
                return Err(IngestionError::LayerShape {
                    layer,
                    expected,
                    actual: mask.len(),
                });
            }
        }
        Ok(())
    }

    /// Bring the axes into ascending order.
    ///
    /// A strictly descending latitude axis is reversed together with the
    /// mask rows. Any other latitude order, or a longitude axis that is not
    /// strictly ascending, is rejected.
    pub fn normalize_axes(&mut self) -> Result<AxisOrientation> {
        if !is_strictly_ascending(&self.lon) {
            return Err(IngestionError::AxisOrder(
                "longitudes must be strictly ascending".to_string(),
            ));
        }

        if is_strictly_ascending(&self.lat) {
            return Ok(AxisOrientation::Ascending);
        }

        let descending = self.lat.windows(2).all(|w| w[0] > w[1]);
        if !descending {
            return Err(IngestionError::AxisOrder(
                "latitudes are neither ascending nor descending".to_string(),
            ));
        }

        self.lat.reverse();
        let width = self.width();
        flip_rows(&mut self.snow, width);
        flip_rows(&mut self.cloud, width);
        if let Some(mask) = self.cloud_buffer.as_mut() {
            flip_rows(mask, width);
        }
        if let Some(mask) = self.invalid.as_mut() {
            flip_rows(mask, width);
        }

        tracing::debug!(rows = self.height(), "Flipped descending latitude axis");
        Ok(AxisOrientation::Flipped)
    }

    /// Classify every pixel on the native lattice.
    pub fn classify(&self) -> Vec<SnowClass> {
        let mut cells = vec![SnowClass::NoSnow; self.width() * self.height()];

        for (name, mask) in self.masks() {
            if name == "snow" {
                continue;
            }
            for (cell, &flag) in cells.iter_mut().zip(mask) {
                if flag {
                    *cell = SnowClass::Unknown;
                }
            }
        }

        for (cell, &flag) in cells.iter_mut().zip(&self.snow) {
            if flag {
                *cell = SnowClass::Snow;
            }
        }

        cells
    }

    /// Build a snow raster from the layers.
    ///
    /// Without a grid the raster stays on the native lattice and is flagged
    /// as non-internal. With a grid it is resampled onto the lattice; cells
    /// outside the observation's coverage become unknown.
    pub fn to_raster(mut self, grid: Option<&GeoGrid>) -> Result<SnowRaster> {
        self.normalize_axes()?;
        let native = SnowRaster::new(self.width(), self.height(), self.classify(), false)?;

        let raster = match grid {
            Some(grid) => grid.resample_raster(&native, &self.lon, &self.lat)?,
            None => native,
        };

        let counts = raster.counts();
        tracing::debug!(
            rows = raster.height(),
            cols = raster.width(),
            is_internal = raster.is_internal(),
            snow = counts.snow,
            no_snow = counts.no_snow,
            unknown = counts.unknown,
            "Classified observation"
        );

        Ok(raster)
    }
}

fn is_strictly_ascending(axis: &[f64]) -> bool {
    axis.windows(2).all(|w| w[0] < w[1])
}

fn flip_rows<T>(data: &mut [T], width: usize) {
    if width == 0 {
        return;
    }
    let height = data.len() / width;
    for row in 0..height / 2 {
        let mirror = height - 1 - row;
        let (head, tail) = data.split_at_mut(mirror * width);
        head[row * width..(row + 1) * width].swap_with_slice(&mut tail[..width]);
    }
}
