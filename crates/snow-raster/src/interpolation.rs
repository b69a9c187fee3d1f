//! Nearest-neighbour lookup on rectilinear lattices.

/// Index of the axis value nearest to `x`.
///
/// `axis` must be strictly increasing. Returns `None` when `x` lies outside
/// `[axis[0], axis[last]]`. A value exactly halfway between two axis points
/// resolves to the lower index.
pub fn nearest_index(axis: &[f64], x: f64) -> Option<usize> {
    let n = axis.len();
    if n == 0 || x.is_nan() {
        return None;
    }
    if x < axis[0] || x > axis[n - 1] {
        return None;
    }
    if n == 1 {
        return Some(0);
    }

    // First index with axis[i] >= x, then step back to the bracketing interval
    let upper = axis.partition_point(|&v| v < x);
    let lower = upper.saturating_sub(1).min(n - 2);

    let t = (x - axis[lower]) / (axis[lower + 1] - axis[lower]);
    if t <= 0.5 {
        Some(lower)
    } else {
        Some(lower + 1)
    }
}

/// Nearest neighbour interpolation on a row-major grid described by axes.
///
/// `data` has `axis_x.len()` columns and `axis_y.len()` rows.
pub fn nearest_interpolate<T: Copy>(
    data: &[T],
    axis_x: &[f64],
    axis_y: &[f64],
    x: f64,
    y: f64,
) -> Option<T> {
    let col = nearest_index(axis_x, x)?;
    let row = nearest_index(axis_y, y)?;
    data.get(row * axis_x.len() + col).copied()
}

/// `n` evenly spaced samples from `start` to `end`, both inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + i as f64 * step })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_index() {
        let axis = [0.0, 1.0, 2.0, 4.0];

        assert_eq!(nearest_index(&axis, 0.0), Some(0));
        assert_eq!(nearest_index(&axis, 0.4), Some(0));
        assert_eq!(nearest_index(&axis, 0.5), Some(0));
        assert_eq!(nearest_index(&axis, 0.6), Some(1));
        assert_eq!(nearest_index(&axis, 2.0), Some(2));
        assert_eq!(nearest_index(&axis, 3.1), Some(3));
        assert_eq!(nearest_index(&axis, 4.0), Some(3));
    }

    #[test]
    fn test_nearest_index_out_of_bounds() {
        let axis = [0.0, 1.0, 2.0];
        assert_eq!(nearest_index(&axis, -0.01), None);
        assert_eq!(nearest_index(&axis, 2.01), None);
        assert_eq!(nearest_index(&axis, f64::NAN), None);
        assert_eq!(nearest_index(&[], 0.0), None);
    }

    #[test]
    fn test_nearest_index_single_point() {
        assert_eq!(nearest_index(&[3.0], 3.0), Some(0));
        assert_eq!(nearest_index(&[3.0], 3.5), None);
    }

    #[test]
    fn test_nearest_interpolate() {
        let data: Vec<i8> = vec![
            1, 2, 3,
            4, 5, 6,
            7, 8, 9,
        ];
        let axis = [0.0, 1.0, 2.0];

        assert_eq!(nearest_interpolate(&data, &axis, &axis, 0.0, 0.0), Some(1));
        assert_eq!(nearest_interpolate(&data, &axis, &axis, 1.0, 1.0), Some(5));
        assert_eq!(nearest_interpolate(&data, &axis, &axis, 0.4, 0.4), Some(1));
        assert_eq!(nearest_interpolate(&data, &axis, &axis, 0.6, 0.6), Some(5));
        assert_eq!(nearest_interpolate(&data, &axis, &axis, 2.0, 0.0), Some(3));
        assert_eq!(nearest_interpolate(&data, &axis, &axis, 3.0, 0.0), None);
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
