//! Snow raster carried across update runs.
//!
//! A [`TemporalSnowMap`] owns a [`SnowRaster`] and the timestamp of the
//! latest observation merged into it. Observations must be merged in
//! ascending timestamp order; the map does not reorder them.

use chrono::{DateTime, Utc};
use snowline_common::{SnowlineError, SnowlineResult};

use crate::boundary::ClusterBoundary;
use crate::class::SnowClass;
use crate::grid::GeoGrid;
use crate::raster::{FilterSummary, SnowRaster, StateCounts};

/// A snow raster plus the time of the last merged observation.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalSnowMap {
    raster: SnowRaster,
    timestamp: Option<DateTime<Utc>>,
}

impl TemporalSnowMap {
    /// Wrap an existing raster.
    pub fn new(raster: SnowRaster, timestamp: Option<DateTime<Utc>>) -> Self {
        Self { raster, timestamp }
    }

    /// An all-unknown internal map without timestamp.
    pub fn blank(grid: &GeoGrid) -> Self {
        Self::new(grid.blank_raster(), None)
    }

    /// Merge a newer observation into the map.
    ///
    /// Per cell: snow in `other` wins, then no-snow; unknown cells in
    /// `other` keep the current state. Afterwards the timestamp is set to
    /// `timestamp`. Nothing is modified when an error is returned.
    pub fn update(&mut self, other: &SnowRaster, timestamp: DateTime<Utc>) -> SnowlineResult<()> {
        if self.raster.is_internal() != other.is_internal() {
            return Err(SnowlineError::Compatibility(format!(
                "cannot merge a raster with is_internal={} into one with is_internal={}",
                other.is_internal(),
                self.raster.is_internal()
            )));
        }
        if !self.raster.is_internal() {
            tracing::warn!(
                "Merging two rasters that are not on the internal lattice; compatibility cannot be checked"
            );
        }
        if self.raster.shape() != other.shape() {
            return Err(SnowlineError::shape_mismatch(self.raster.shape(), other.shape()));
        }

        let mut changed = 0usize;
        for (cell, &incoming) in self.raster.cells_mut().iter_mut().zip(other.cells()) {
            let merged = match incoming {
                SnowClass::Snow => SnowClass::Snow,
                SnowClass::NoSnow => SnowClass::NoSnow,
                SnowClass::Unknown => *cell,
            };
            if merged != *cell {
                changed += 1;
                *cell = merged;
            }
        }

        self.timestamp = Some(timestamp);

        tracing::debug!(
            timestamp = %timestamp,
            changed_cells = changed,
            "Merged observation"
        );

        Ok(())
    }

    /// True if an observation taken at `candidate` would be newer than the map.
    pub fn is_newer(&self, candidate: DateTime<Utc>) -> bool {
        match self.timestamp {
            None => true,
            Some(ts) => ts < candidate,
        }
    }

    /// Time of the last merged observation.
    pub fn get_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Borrow the underlying raster.
    pub fn raster(&self) -> &SnowRaster {
        &self.raster
    }

    /// Consume the map, returning the raster and timestamp.
    pub fn into_parts(self) -> (SnowRaster, Option<DateTime<Utc>>) {
        (self.raster, self.timestamp)
    }

    /// A copy of the cells.
    pub fn get_array(&self) -> Vec<SnowClass> {
        self.raster.get_array()
    }

    pub fn is_internal(&self) -> bool {
        self.raster.is_internal()
    }

    pub fn counts(&self) -> StateCounts {
        self.raster.counts()
    }

    /// See [`SnowRaster::filter_size_snow`].
    pub fn filter_size_snow(&mut self, min_size: usize, include_unknown: bool) -> FilterSummary {
        self.raster.filter_size_snow(min_size, include_unknown)
    }

    /// See [`SnowRaster::filter_size_nonsnow`].
    pub fn filter_size_nonsnow(&mut self, min_size: usize, include_unknown: bool) -> FilterSummary {
        self.raster.filter_size_nonsnow(min_size, include_unknown)
    }

    pub fn get_num_clusters(&self) -> usize {
        self.raster.get_num_clusters()
    }

    pub fn get_boundaries(&self) -> Vec<ClusterBoundary> {
        self.raster.get_boundaries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_merge_precedence_all_combinations() {
        // Prior state per row, incoming state per column
        let prior: Vec<i8> = vec![
            1, 1, 1,
            0, 0, 0,
            -1, -1, -1,
        ];
        let other: Vec<i8> = vec![
            1, 0, -1,
            1, 0, -1,
            1, 0, -1,
        ];
        let expected: Vec<i8> = vec![
            1, 1, -1,
            1, 0, -1,
            1, -1, -1,
        ];

        let mut map = TemporalSnowMap::new(SnowRaster::from_raw(3, 3, &prior, true).unwrap(), None);
        map.update(&SnowRaster::from_raw(3, 3, &other, true).unwrap(), ts(10))
            .unwrap();
        assert_eq!(map.raster().to_raw(), expected);
        assert_eq!(map.get_timestamp(), Some(ts(10)));
    }

    #[test]
    fn test_internal_mismatch_is_rejected() {
        let mut map = TemporalSnowMap::new(SnowRaster::filled(2, 2, SnowClass::Unknown, true), None);
        let other = SnowRaster::filled(2, 2, SnowClass::Snow, false);
        let result = map.update(&other, ts(1));
        assert!(matches!(result, Err(SnowlineError::Compatibility(_))));
        assert_eq!(map.counts().unknown, 4);
        assert_eq!(map.get_timestamp(), None);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let mut map = TemporalSnowMap::new(SnowRaster::filled(2, 2, SnowClass::Unknown, true), None);
        let other = SnowRaster::filled(3, 2, SnowClass::Snow, true);
        assert!(matches!(
            map.update(&other, ts(1)),
            Err(SnowlineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_non_internal_merge_is_allowed() {
        let mut map = TemporalSnowMap::new(SnowRaster::filled(2, 2, SnowClass::Unknown, false), None);
        let other = SnowRaster::filled(2, 2, SnowClass::Snow, false);
        map.update(&other, ts(5)).unwrap();
        assert_eq!(map.counts().snow, 4);
    }

    #[test]
    fn test_is_newer() {
        let mut map = TemporalSnowMap::new(SnowRaster::filled(1, 1, SnowClass::Unknown, true), None);
        assert!(map.is_newer(ts(0)));

        map.update(&SnowRaster::filled(1, 1, SnowClass::Snow, true), ts(100))
            .unwrap();
        assert!(map.is_newer(ts(101)));
        assert!(!map.is_newer(ts(100)));
        assert!(!map.is_newer(ts(99)));
    }

    #[test]
    fn test_later_observation_overwrites() {
        let mut map = TemporalSnowMap::new(SnowRaster::filled(1, 1, SnowClass::Unknown, true), None);
        map.update(&SnowRaster::filled(1, 1, SnowClass::Snow, true), ts(1)).unwrap();
        map.update(&SnowRaster::filled(1, 1, SnowClass::Unknown, true), ts(2)).unwrap();
        assert_eq!(map.raster().get(0, 0), Some(SnowClass::Snow));
        map.update(&SnowRaster::filled(1, 1, SnowClass::NoSnow, true), ts(3)).unwrap();
        assert_eq!(map.raster().get(0, 0), Some(SnowClass::NoSnow));
        assert_eq!(map.get_timestamp(), Some(ts(3)));
    }
}
