//! Shared test utilities for the snowline workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Snow-state pattern generators (raw `-1 / 0 / 1` codes)
//! - Common bounding boxes and lattice fixtures
//! - Approximate comparison macros
//!
//! It deliberately has no dependency on the workspace crates so that any of
//! them can pull it in as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, generators::pattern};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of `[lon, lat]` pairs.
///
/// # Usage
///
/// ```
/// use test_utils::assert_coords_approx_eq;
///
/// assert_coords_approx_eq!([5.70001, 45.7], [5.7, 45.7], 0.001);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: [f64; 2] = $left;
        let right: [f64; 2] = $right;
        $crate::assert_approx_eq!(left[0], right[0], $epsilon);
        $crate::assert_approx_eq!(left[1], right[1], $epsilon);
    }};
}
