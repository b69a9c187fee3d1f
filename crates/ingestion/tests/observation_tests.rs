//! Integration tests: classification layers through archives into the state.

use chrono::{DateTime, Utc};
use ingestion::{load_observation, merge_observations, ClassificationLayers, IngestionError};
use snow_raster::{GeoGrid, GridConfig, SnowRaster, TemporalSnowMap};
use snowline_common::BoundingBox;
use storage::RasterArchive;
use test_utils::{filenames, scratch_dir, scratch_path};

fn grid() -> GeoGrid {
    GeoGrid::new(GridConfig {
        bbox: BoundingBox::new(0.0, 0.0, 3.0, 3.0),
        resolution_m: 1.0,
        meters_per_degree_x: 1.0,
        meters_per_degree_y: 1.0,
    })
    .unwrap()
}

fn flags(s: &str) -> Vec<bool> {
    s.chars().filter(|c| !c.is_whitespace()).map(|c| c == '1').collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_timestamp_from_filename_fallback() {
    let dir = scratch_dir();
    let path = scratch_path(&dir, filenames::WITH_TIMESTAMP);
    let raster = SnowRaster::from_raw(3, 3, &[1; 9], true).unwrap();
    RasterArchive::new(raster, None).save(&path).unwrap();

    let observation = load_observation(&path).unwrap();
    assert_eq!(observation.timestamp.timestamp(), filenames::WITH_TIMESTAMP_UNIX);
}

#[test]
fn test_attribute_timestamp_wins() {
    let dir = scratch_dir();
    let path = scratch_path(&dir, filenames::WITH_TIMESTAMP);
    let stamped = DateTime::<Utc>::from_timestamp(42, 0);
    let raster = SnowRaster::from_raw(3, 3, &[1; 9], true).unwrap();
    RasterArchive::new(raster, stamped).save(&path).unwrap();

    assert_eq!(load_observation(&path).unwrap().timestamp, stamped.unwrap());
}

#[test]
fn test_missing_timestamp_is_an_error() {
    let dir = scratch_dir();
    let path = scratch_path(&dir, filenames::WITHOUT_TIMESTAMP);
    let raster = SnowRaster::from_raw(3, 3, &[1; 9], true).unwrap();
    RasterArchive::new(raster, None).save(&path).unwrap();

    assert!(matches!(load_observation(&path), Err(IngestionError::Raster(_))));
}

#[test]
fn test_native_lattice_observation_rejected() {
    let dir = scratch_dir();
    let path = scratch_path(&dir, filenames::WITH_TIMESTAMP);
    let raster = SnowRaster::from_raw(2, 2, &[1; 4], false).unwrap();
    RasterArchive::new(raster, None).save(&path).unwrap();

    assert!(matches!(load_observation(&path), Err(IngestionError::NotOnLattice(_))));
}

// ============================================================================
// Full pipeline
// ============================================================================

#[test]
fn test_layers_to_state() {
    let grid = grid();
    let dir = scratch_dir();

    let first = ClassificationLayers::new(
        vec![0.0, 1.5, 3.0],
        vec![3.0, 1.5, 0.0],
        flags("111 000 000"),
        flags("000 111 000"),
    )
    .unwrap()
    .to_raster(Some(&grid))
    .unwrap();
    let second = ClassificationLayers::new(
        vec![0.0, 1.5, 3.0],
        vec![0.0, 1.5, 3.0],
        flags("000 000 000"),
        flags("111 000 111"),
    )
    .unwrap()
    .to_raster(Some(&grid))
    .unwrap();

    let first_path = scratch_path(&dir, "obs_20200101T100000_a.tar.gz");
    let second_path = scratch_path(&dir, "obs_20200102T100000_b.tar.gz");
    RasterArchive::new(first, None).save(&first_path).unwrap();
    RasterArchive::new(second, None).save(&second_path).unwrap();

    let observations = vec![
        load_observation(&second_path).unwrap(),
        load_observation(&first_path).unwrap(),
    ];

    let mut state = TemporalSnowMap::blank(&grid);
    let report = merge_observations(&mut state, observations).unwrap();
    assert_eq!(report.merged, vec![first_path, second_path]);

    // North row snow from the first pass survives the cloudy second pass,
    // the middle row is cleared by the second pass.
    assert_eq!(state.raster().to_raw(), vec![-1, -1, -1, -1, -1, -1, 1, 1, 1]);
}
