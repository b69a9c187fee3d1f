//! Isoline extraction using the marching squares algorithm.
//!
//! Data values sit on integer lattice positions `(x = column, y = row)`;
//! contour vertices are interpolated along cell edges, so for a binary
//! field contoured at 0.5 every vertex lies halfway between two samples.

use std::collections::HashMap;

/// A point in 2D space (pixel coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A connected contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Marching squares algorithm to generate contour segments
///
/// # Arguments
/// * `data` - Grid data in row-major order
/// * `width` - Grid width
/// * `height` - Grid height
/// * `level` - Contour level to extract
///
/// # Returns
/// Vector of line segments representing the contour
pub fn march_squares(data: &[f64], width: usize, height: usize, level: f64) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            // Cell index (0-15) from which corners are at or above the level
            let mut cell_index = 0u8;
            if tl >= level { cell_index |= 1; }
            if tr >= level { cell_index |= 2; }
            if br >= level { cell_index |= 4; }
            if bl >= level { cell_index |= 8; }

            if cell_index == 0 || cell_index == 15 {
                continue;
            }

            segments.extend(get_cell_segments(
                cell_index,
                x as f64, y as f64,
                tl, tr, br, bl,
                level,
            ));
        }
    }

    segments
}

/// Line segments for one marching squares cell.
///
/// Saddle cells (5 and 10) always cut off the two corners that are above
/// the level, so diagonally touching samples never end up inside the same
/// loop.
#[allow(clippy::too_many_arguments)]
fn get_cell_segments(
    cell_index: u8,
    x: f64,
    y: f64,
    tl: f64,
    tr: f64,
    br: f64,
    bl: f64,
    level: f64,
) -> Vec<Segment> {
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    match cell_index {
        1 | 14 => vec![Segment { start: left, end: top }],
        2 | 13 => vec![Segment { start: top, end: right }],
        3 | 12 => vec![Segment { start: left, end: right }],
        4 | 11 => vec![Segment { start: right, end: bottom }],
        5 => vec![
            Segment { start: left, end: top },
            Segment { start: right, end: bottom },
        ],
        6 | 9 => vec![Segment { start: top, end: bottom }],
        7 | 8 => vec![Segment { start: left, end: bottom }],
        10 => vec![
            Segment { start: top, end: right },
            Segment { start: left, end: bottom },
        ],
        _ => vec![],
    }
}

/// Linearly interpolate between two edge points based on data values
fn interpolate_edge(
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    val1: f64,
    val2: f64,
    level: f64,
) -> Point {
    if (val2 - val1).abs() < 1e-12 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);

    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Quantized key so shared edge vertices of neighbouring cells compare equal.
fn vertex_key(p: Point) -> (i64, i64) {
    ((p.x * 1e6).round() as i64, (p.y * 1e6).round() as i64)
}

/// Connect line segments into continuous polylines
///
/// Segments are matched on shared endpoints. A polyline whose ends meet is
/// marked closed and its last point is set equal to its first.
pub fn connect_segments(segments: &[Segment]) -> Vec<Contour> {
    if segments.is_empty() {
        return vec![];
    }

    let mut by_vertex: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_vertex.entry(vertex_key(seg.start)).or_default().push(i);
        by_vertex.entry(vertex_key(seg.end)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;

        let mut points = vec![segments[start_idx].start, segments[start_idx].end];
        extend_chain(&mut points, segments, &by_vertex, &mut used);

        let closed = points.len() > 2
            && vertex_key(points[0]) == vertex_key(points[points.len() - 1]);

        if !closed {
            // Open line: grow the other end as well
            points.reverse();
            extend_chain(&mut points, segments, &by_vertex, &mut used);
            points.reverse();
        }

        if closed {
            let first = points[0];
            if let Some(last) = points.last_mut() {
                *last = first;
            }
        }

        contours.push(Contour { points, closed });
    }

    contours
}

/// Append unused segments to the tail of `points` until none connects.
fn extend_chain(
    points: &mut Vec<Point>,
    segments: &[Segment],
    by_vertex: &HashMap<(i64, i64), Vec<usize>>,
    used: &mut [bool],
) {
    loop {
        let Some(&tail) = points.last() else { return };
        let tail_key = vertex_key(tail);

        let next = by_vertex
            .get(&tail_key)
            .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));

        let Some(i) = next else { return };
        used[i] = true;

        let seg = &segments[i];
        if vertex_key(seg.start) == tail_key {
            points.push(seg.end);
        } else {
            points.push(seg.start);
        }

        if points.len() > 2 && vertex_key(points[0]) == vertex_key(points[points.len() - 1]) {
            return;
        }
    }
}

/// Signed area of a closed polyline (shoelace formula).
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for pair in points.windows(2) {
        area += pair[0].x * pair[1].y - pair[1].x * pair[0].y;
    }
    area / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_edge() {
        let p = interpolate_edge(0.0, 0.0, 1.0, 0.0, 0.0, 10.0, 5.0);
        assert!((p.x - 0.5).abs() < 1e-9);
        assert!((p.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_march_squares_flat() {
        let data = vec![1.0; 9];
        let segments = march_squares(&data, 3, 3, 0.5);
        assert!(segments.is_empty());
    }

    #[test]
    fn test_march_squares_invalid_dimensions() {
        assert!(march_squares(&[1.0], 1, 1, 0.5).is_empty());
        assert!(march_squares(&[1.0, 0.0], 3, 3, 0.5).is_empty());
    }

    #[test]
    fn test_single_peak_forms_closed_diamond() {
        let data = vec![
            0.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 0.0,
        ];
        let segments = march_squares(&data, 3, 3, 0.5);
        assert_eq!(segments.len(), 4);

        let contours = connect_segments(&segments);
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        assert!(contour.closed);
        assert_eq!(contour.points.len(), 5);
        assert_eq!(contour.points[0], contour.points[4]);
        assert!((signed_area(&contour.points).abs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_saddle_keeps_diagonals_apart() {
        let data = vec![
            0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ];
        let contours = connect_segments(&march_squares(&data, 4, 4, 0.5));
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(|c| c.closed && c.points.len() == 5));
    }

    #[test]
    fn test_open_line_is_joined_from_both_ends() {
        // Step edge crossing the whole field
        let data = vec![
            1.0, 1.0, 0.0,
            1.0, 1.0, 0.0,
            1.0, 1.0, 0.0,
            1.0, 1.0, 0.0,
        ];
        let segments = march_squares(&data, 3, 4, 0.5);
        assert_eq!(segments.len(), 3);
        // Start from the middle segment so the chain must grow both ways
        let reordered = vec![segments[1].clone(), segments[0].clone(), segments[2].clone()];
        let contours = connect_segments(&reordered);
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].closed);
        assert_eq!(contours[0].points.len(), 4);
        assert_eq!(contours[0].points[0], Point::new(1.5, 0.0));
        assert_eq!(contours[0].points[3], Point::new(1.5, 3.0));
    }
}
