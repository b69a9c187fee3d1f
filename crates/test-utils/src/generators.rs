//! Synthetic snow-state patterns.
//!
//! Everything here produces raw row-major `i8` codes (`1` snow, `0` unknown,
//! `-1` no snow) so the tests decide themselves which raster type to wrap
//! them in.

pub const SNOW: i8 = 1;
pub const UNKNOWN: i8 = 0;
pub const NO_SNOW: i8 = -1;

/// Parse an ASCII picture into `(codes, width, height)`.
///
/// `#` is snow, `.` is no snow and `?` is unknown. All rows must have the
/// same length.
///
/// # Example
///
/// ```
/// use test_utils::pattern;
///
/// let (codes, width, height) = pattern(&["#.", "?#"]);
/// assert_eq!((width, height), (2, 2));
/// assert_eq!(codes, vec![1, -1, 0, 1]);
/// ```
pub fn pattern(rows: &[&str]) -> (Vec<i8>, usize, usize) {
    let height = rows.len();
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut codes = Vec::with_capacity(width * height);
    for row in rows {
        assert_eq!(row.len(), width, "ragged pattern row {:?}", row);
        for ch in row.chars() {
            codes.push(match ch {
                '#' => SNOW,
                '.' => NO_SNOW,
                '?' => UNKNOWN,
                other => panic!("unexpected pattern character {:?}", other),
            });
        }
    }
    (codes, width, height)
}

/// Alternating snow / no-snow cells; cell (0, 0) is snow.
///
/// Every snow cell is its own 4-connected cluster.
pub fn checkerboard(width: usize, height: usize) -> Vec<i8> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(if (row + col) % 2 == 0 { SNOW } else { NO_SNOW });
        }
    }
    data
}

/// A filled disk of `inside` cells on an `outside` background.
pub fn disk(
    width: usize,
    height: usize,
    center: (f64, f64),
    radius: f64,
    inside: i8,
    outside: i8,
) -> Vec<i8> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f64 - center.0;
            let dy = row as f64 - center.1;
            data.push(if dx * dx + dy * dy <= radius * radius {
                inside
            } else {
                outside
            });
        }
    }
    data
}

/// Deterministic pseudo-random mixture of the three states.
///
/// `snow_permille` and `unknown_permille` give the approximate share of
/// snow and unknown cells; the rest is no snow. The same `seed` always
/// yields the same field.
pub fn speckle(
    width: usize,
    height: usize,
    snow_permille: u32,
    unknown_permille: u32,
    seed: u64,
) -> Vec<i8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..width * height {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let roll = (state % 1000) as u32;
        data.push(if roll < snow_permille {
            SNOW
        } else if roll < snow_permille + unknown_permille {
            UNKNOWN
        } else {
            NO_SNOW
        });
    }
    data
}
