//! Boundary tracing for snow clusters.
//!
//! The mask is padded by one background cell on every side so that
//! clusters touching the raster edge still produce closed loops. Each
//! cluster is then contoured at 0.5 over its own membership mask, which
//! yields one exterior loop plus one loop per hole.

use crate::cluster::label_clusters;
use crate::contour::{connect_segments, march_squares, signed_area, Point};

/// Isovalue between in-cluster (1) and out-of-cluster (0) cells.
const CONTOUR_LEVEL: f64 = 0.5;

/// A closed loop of vertices; the first vertex equals the last.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<Point>,
}

impl Ring {
    pub(crate) fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Vertices, with the closing vertex repeated at the end.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True if the first and last vertex coincide.
    pub fn is_closed(&self) -> bool {
        self.points.len() > 1 && self.points.first() == self.points.last()
    }

    /// Number of vertices without the closing repeat.
    pub fn distinct_vertices(&self) -> usize {
        if self.is_closed() {
            self.points.len() - 1
        } else {
            self.points.len()
        }
    }

    /// Signed enclosed area in square pixels.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.points)
    }

    /// Drop vertices lying on a straight line between their neighbours.
    pub fn simplified(&self, deviation: f64) -> Ring {
        Ring::new(clean_up_line(&self.points, deviation))
    }

    /// Vertices as `[x, y]` pairs.
    pub fn to_coordinates(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| [p.x, p.y]).collect()
    }
}

/// All boundary loops of one connected snow cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterBoundary {
    /// Label assigned by the cluster scan.
    pub label: u32,
    /// Number of cells in the cluster.
    pub size: usize,
    /// Exterior loop first, then holes.
    pub rings: Vec<Ring>,
}

impl ClusterBoundary {
    /// Simplify every ring; see [`clean_up_line`].
    pub fn simplified(&self, deviation: f64) -> ClusterBoundary {
        ClusterBoundary {
            label: self.label,
            size: self.size,
            rings: self.rings.iter().map(|r| r.simplified(deviation)).collect(),
        }
    }
}

/// Remove points that lie on the line through their neighbours.
///
/// An interior point is kept only if it deviates from the midpoint of its
/// two neighbours by more than `deviation` on either axis. The first and
/// last points are always kept.
pub fn clean_up_line(points: &[Point], deviation: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = vec![points[0]];
    for window in points.windows(3) {
        let (prev, point, next) = (window[0], window[1], window[2]);
        let mid_x = 0.5 * (prev.x + next.x);
        let mid_y = 0.5 * (prev.y + next.y);
        if (mid_x - point.x).abs() > deviation || (mid_y - point.y).abs() > deviation {
            kept.push(point);
        }
    }
    kept.push(points[points.len() - 1]);
    kept
}

/// Trace the boundaries of every 4-connected cluster in `mask`.
///
/// Coordinates are pixel coordinates of the unpadded mask: `(x = column,
/// y = row)` with cell centres on integers, so vertices fall on half-integer
/// positions.
pub fn trace_boundaries(mask: &[bool], width: usize, height: usize) -> Vec<ClusterBoundary> {
    if width == 0 || height == 0 {
        return vec![];
    }

    let padded_width = width + 2;
    let padded_height = height + 2;
    let mut padded = vec![false; padded_width * padded_height];
    for row in 0..height {
        let src = &mask[row * width..(row + 1) * width];
        let dst_start = (row + 1) * padded_width + 1;
        padded[dst_start..dst_start + width].copy_from_slice(src);
    }

    let labeling = label_clusters(&padded, padded_width, padded_height);
    let mut boundaries = Vec::with_capacity(labeling.num_clusters());

    for label in 1..=labeling.num_clusters() as u32 {
        let Some(extent) = labeling.extent(label) else {
            continue;
        };

        // Window around the cluster with one background cell of margin;
        // the padding guarantees the margin exists.
        let row0 = extent.min_row - 1;
        let col0 = extent.min_col - 1;
        let win_height = extent.max_row - extent.min_row + 3;
        let win_width = extent.max_col - extent.min_col + 3;

        let mut window = vec![0.0f64; win_width * win_height];
        for r in 0..win_height {
            for c in 0..win_width {
                if labeling.label_at(row0 + r, col0 + c) == label {
                    window[r * win_width + c] = 1.0;
                }
            }
        }

        let segments = march_squares(&window, win_width, win_height, CONTOUR_LEVEL);
        // Shift from window coordinates back to unpadded raster coordinates
        let dx = col0 as f64 - 1.0;
        let dy = row0 as f64 - 1.0;

        let mut rings: Vec<Ring> = connect_segments(&segments)
            .into_iter()
            .filter(|contour| {
                if !contour.closed {
                    tracing::warn!(label = label, "Discarding open contour");
                }
                contour.closed
            })
            .map(|contour| {
                Ring::new(contour.points.into_iter().map(|p| p.offset(dx, dy)).collect())
            })
            .collect();

        // Exterior ring encloses the largest area
        rings.sort_by(|a, b| b.signed_area().abs().total_cmp(&a.signed_area().abs()));

        boundaries.push(ClusterBoundary {
            label,
            size: labeling.size(label),
            rings,
        });
    }

    tracing::debug!(
        clusters = boundaries.len(),
        rings = boundaries.iter().map(|b| b.rings.len()).sum::<usize>(),
        "Traced cluster boundaries"
    );

    boundaries
}
