//! The ternary snow raster and its cluster-size filters.
//!
//! Satellite classification produces isolated misclassified pixels inside
//! otherwise uniform snow or bare-ground regions. The size filters remove
//! this noise by reclassifying whole clusters below a pixel-count threshold,
//! which leaves the remaining boundaries untouched.

use snowline_common::{SnowlineError, SnowlineResult};

use crate::boundary::{trace_boundaries, ClusterBoundary};
use crate::class::SnowClass;
use crate::cluster::{label_clusters, Labeling};

/// Outcome of a cluster-size filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    /// Clusters found before filtering.
    pub clusters: usize,
    /// Clusters below the threshold that were reclassified.
    pub removed_clusters: usize,
    /// Cells whose state changed.
    pub reclassified_cells: usize,
}

/// Per-state cell counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub snow: usize,
    pub no_snow: usize,
    pub unknown: usize,
}

/// A 2D raster of [`SnowClass`] cells, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SnowRaster {
    width: usize,
    height: usize,
    cells: Vec<SnowClass>,
    is_internal: bool,
}

impl SnowRaster {
    /// Create a raster from classified cells.
    ///
    /// `is_internal` states whether the cells are already on the internal
    /// lattice.
    pub fn new(
        width: usize,
        height: usize,
        cells: Vec<SnowClass>,
        is_internal: bool,
    ) -> SnowlineResult<Self> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            SnowlineError::Validation(format!("raster of {}x{} cells is too large", height, width))
        })?;
        if cells.len() != expected {
            return Err(SnowlineError::ShapeMismatch {
                expected: format!("{}x{} ({} cells)", height, width, expected),
                actual: format!("{} cells", cells.len()),
            });
        }

        Ok(Self {
            width,
            height,
            cells,
            is_internal,
        })
    }

    /// Create a raster from integer codes, rejecting anything but -1, 0 and 1.
    pub fn from_raw(
        width: usize,
        height: usize,
        raw: &[i8],
        is_internal: bool,
    ) -> SnowlineResult<Self> {
        Self::from_codes(width, height, raw.iter().map(|&v| i64::from(v)), is_internal)
    }

    /// Create a raster from wide integer codes, rejecting anything but -1, 0 and 1.
    pub fn from_codes<I>(width: usize, height: usize, codes: I, is_internal: bool) -> SnowlineResult<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let cells = codes
            .into_iter()
            .map(SnowClass::from_code)
            .collect::<SnowlineResult<Vec<_>>>()?;
        Self::new(width, height, cells, is_internal)
    }

    /// A raster with every cell set to `class`.
    pub fn filled(width: usize, height: usize, class: SnowClass, is_internal: bool) -> Self {
        Self {
            width,
            height,
            cells: vec![class; width * height],
            is_internal,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Whether the raster is expressed on the internal lattice.
    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    /// Borrow the cells.
    pub fn cells(&self) -> &[SnowClass] {
        &self.cells
    }

    /// A copy of the cells; mutating it does not affect the raster.
    pub fn get_array(&self) -> Vec<SnowClass> {
        self.cells.clone()
    }

    /// The cells as signed integer codes.
    pub fn to_raw(&self) -> Vec<i8> {
        self.cells.iter().map(|c| c.code()).collect()
    }

    /// State of the cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<SnowClass> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.cells[row * self.width + col])
    }

    /// Number of cells per state.
    pub fn counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for cell in &self.cells {
            match cell {
                SnowClass::Snow => counts.snow += 1,
                SnowClass::NoSnow => counts.no_snow += 1,
                SnowClass::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [SnowClass] {
        &mut self.cells
    }

    /// Remove snow clusters smaller than `min_size` pixels.
    ///
    /// With `include_unknown`, unknown cells join the clusters so snow
    /// slivers separated only by unknown cells count toward one cluster.
    /// Clusters below the threshold become [`SnowClass::NoSnow`] entirely.
    /// A `min_size` below 1 leaves the raster untouched.
    pub fn filter_size_snow(&mut self, min_size: usize, include_unknown: bool) -> FilterSummary {
        self.filter_size(SnowClass::Snow, SnowClass::NoSnow, min_size, include_unknown)
    }

    /// Remove non-snow clusters smaller than `min_size` pixels.
    ///
    /// The mirror image of [`SnowRaster::filter_size_snow`]: clusters below
    /// the threshold become [`SnowClass::Snow`].
    pub fn filter_size_nonsnow(&mut self, min_size: usize, include_unknown: bool) -> FilterSummary {
        self.filter_size(SnowClass::NoSnow, SnowClass::Snow, min_size, include_unknown)
    }

    fn filter_size(
        &mut self,
        target: SnowClass,
        replacement: SnowClass,
        min_size: usize,
        include_unknown: bool,
    ) -> FilterSummary {
        if min_size < 1 {
            return FilterSummary::default();
        }

        let mask: Vec<bool> = self
            .cells
            .iter()
            .map(|&c| c == target || (include_unknown && c == SnowClass::Unknown))
            .collect();
        let labeling = label_clusters(&mask, self.width, self.height);

        let small = labeling.small_clusters(min_size);
        let mut remove = vec![false; labeling.num_clusters() + 1];
        for &label in &small {
            remove[label as usize] = true;
        }

        let mut reclassified_cells = 0;
        for (cell, &label) in self.cells.iter_mut().zip(labeling.labels()) {
            if label != 0 && remove[label as usize] && *cell != replacement {
                *cell = replacement;
                reclassified_cells += 1;
            }
        }

        let summary = FilterSummary {
            clusters: labeling.num_clusters(),
            removed_clusters: small.len(),
            reclassified_cells,
        };

        tracing::debug!(
            target_class = ?target,
            min_size = min_size,
            include_unknown = include_unknown,
            clusters = summary.clusters,
            removed = summary.removed_clusters,
            reclassified = summary.reclassified_cells,
            "Cluster size filter applied"
        );

        summary
    }

    /// Label the 4-connected snow clusters.
    pub fn snow_clusters(&self) -> Labeling {
        let mask: Vec<bool> = self.cells.iter().map(|&c| c == SnowClass::Snow).collect();
        label_clusters(&mask, self.width, self.height)
    }

    /// Number of 4-connected snow clusters.
    pub fn get_num_clusters(&self) -> usize {
        self.snow_clusters().num_clusters()
    }

    /// Closed boundary loops around every snow cluster, in pixel coordinates.
    ///
    /// One [`ClusterBoundary`] per cluster, in labeling order. The order is
    /// stable for a given raster but carries no geographic meaning.
    pub fn get_boundaries(&self) -> Vec<ClusterBoundary> {
        let mask: Vec<bool> = self.cells.iter().map(|&c| c == SnowClass::Snow).collect();
        trace_boundaries(&mask, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: i8 = 1;
    const N: i8 = -1;
    const U: i8 = 0;

    #[test]
    fn test_from_raw_rejects_foreign_values() {
        let result = SnowRaster::from_raw(2, 1, &[1, 2], true);
        assert!(matches!(result, Err(SnowlineError::Validation(_))));
    }

    #[test]
    fn test_shape_mismatch() {
        let result = SnowRaster::from_raw(3, 3, &[1, 0, -1], true);
        assert!(matches!(result, Err(SnowlineError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_overflowing_dimensions_rejected() {
        let result = SnowRaster::from_raw(4, usize::MAX / 2, &[], true);
        assert!(matches!(result, Err(SnowlineError::Validation(_))));
    }

    #[test]
    fn test_get_array_is_a_copy() {
        let raster = SnowRaster::from_raw(2, 1, &[S, N], true).unwrap();
        let mut array = raster.get_array();
        array[0] = SnowClass::Unknown;
        assert_eq!(raster.get(0, 0), Some(SnowClass::Snow));
    }

    #[test]
    fn test_filter_snow_threshold_is_strict() {
        #[rustfmt::skip]
        let raw = [
            S, S, N, N,
            N, N, N, S,
            S, N, N, S,
        ];
        let mut raster = SnowRaster::from_raw(4, 3, &raw, true).unwrap();
        let summary = raster.filter_size_snow(2, false);

        // The 2-cell clusters survive, the lone pixel goes
        assert_eq!(summary.clusters, 3);
        assert_eq!(summary.removed_clusters, 1);
        assert_eq!(summary.reclassified_cells, 1);
        assert_eq!(raster.get(2, 0), Some(SnowClass::NoSnow));
        assert_eq!(raster.get(0, 0), Some(SnowClass::Snow));
        assert_eq!(raster.get(1, 3), Some(SnowClass::Snow));
    }

    #[test]
    fn test_filter_snow_with_unknown_bridge() {
        #[rustfmt::skip]
        let raw = [
            S, U, S,
            N, N, N,
        ];
        let mut without = SnowRaster::from_raw(3, 2, &raw, true).unwrap();
        without.filter_size_snow(2, false);
        assert_eq!(without.counts().snow, 0);

        let mut with = SnowRaster::from_raw(3, 2, &raw, true).unwrap();
        let summary = with.filter_size_snow(2, true);
        assert_eq!(summary.removed_clusters, 0);
        assert_eq!(with.counts().snow, 2);
    }

    #[test]
    fn test_filter_snow_with_unknown_reclassifies_whole_cluster() {
        #[rustfmt::skip]
        let raw = [
            S, U, N, N,
            N, N, N, N,
        ];
        let mut raster = SnowRaster::from_raw(4, 2, &raw, true).unwrap();
        let summary = raster.filter_size_snow(3, true);
        assert_eq!(summary.reclassified_cells, 2);
        assert_eq!(raster.counts().no_snow, 8);
    }

    #[test]
    fn test_filter_nonsnow() {
        #[rustfmt::skip]
        let raw = [
            S, S, S,
            S, N, S,
            S, S, N,
        ];
        let mut raster = SnowRaster::from_raw(3, 3, &raw, true).unwrap();
        raster.filter_size_nonsnow(2, false);
        assert_eq!(raster.counts().snow, 9);
    }

    #[test]
    fn test_filters_noop_below_one() {
        #[rustfmt::skip]
        let raw = [
            S, N, U,
            N, S, N,
        ];
        let mut raster = SnowRaster::from_raw(3, 2, &raw, true).unwrap();
        let before = raster.get_array();
        assert_eq!(raster.filter_size_snow(0, false), FilterSummary::default());
        assert_eq!(raster.filter_size_nonsnow(0, true), FilterSummary::default());
        assert_eq!(raster.get_array(), before);
    }

    #[test]
    fn test_num_clusters() {
        #[rustfmt::skip]
        let raw = [
            S, N, S,
            N, S, N,
            S, S, U,
        ];
        let raster = SnowRaster::from_raw(3, 3, &raw, false).unwrap();
        assert_eq!(raster.get_num_clusters(), 3);
    }

    #[test]
    fn test_copy_is_independent() {
        let raster = SnowRaster::from_raw(2, 1, &[S, S], true).unwrap();
        let mut copy = raster.clone();
        copy.filter_size_snow(5, false);
        assert_eq!(raster.counts().snow, 2);
        assert_eq!(copy.counts().snow, 0);
    }
}
