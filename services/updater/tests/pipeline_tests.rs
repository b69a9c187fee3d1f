//! End-to-end tests of the update job on a small lattice.

use chrono::{DateTime, Utc};
use snow_raster::{GeoGrid, GridConfig, SnowRaster, TemporalSnowMap};
use snowline_common::{BoundingBox, FeatureCollection};
use storage::{load_state, save_state, PublishConfig, RasterArchive, SnowlineCatalog};
use test_utils::generators::pattern;
use test_utils::{scratch_dir, scratch_path};
use updater::{UpdateOptions, UpdatePipeline};

fn grid() -> GeoGrid {
    GeoGrid::new(GridConfig {
        bbox: BoundingBox::new(0.0, 0.0, 5.0, 5.0),
        resolution_m: 1.0,
        meters_per_degree_x: 1.0,
        meters_per_degree_y: 1.0,
    })
    .unwrap()
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn write_observation(dir: &tempfile::TempDir, name: &str, rows: &[&str]) -> std::path::PathBuf {
    let (codes, w, h) = pattern(rows);
    let path = scratch_path(dir, name);
    RasterArchive::new(SnowRaster::from_raw(w, h, &codes, true).unwrap(), None)
        .save(&path)
        .unwrap();
    path
}

// ============================================================================
// Full runs
// ============================================================================

#[test]
fn test_blank_start_merge_filter_publish() {
    let dir = scratch_dir();
    let observation = write_observation(
        &dir,
        "obs_20231114T221320_x.tar.gz",
        &[
            "##...",
            "##...",
            ".....",
            "....#",
            ".....",
        ],
    );
    let new_state = scratch_path(&dir, "state.tar.gz");
    let publish_dir = dir.path().join("public");

    let options = UpdateOptions {
        new_state_map: Some(new_state.clone()),
        observations: vec![observation],
        allow_blank: true,
        size_filter_snow: 2,
        publish_dir: publish_dir.clone(),
        ..UpdateOptions::default()
    };
    let summary = UpdatePipeline::new(grid(), PublishConfig::default(), options)
        .run(now())
        .unwrap();

    assert_eq!(summary.merge.merged.len(), 1);
    assert_eq!(summary.boundaries, Some(1));

    // The saved state is the unfiltered merge result
    let saved = load_state(&new_state).unwrap();
    assert_eq!(saved.counts().snow, 5);
    assert!(saved.get_timestamp().is_some());

    let published = summary.published.unwrap();
    assert!(published.written);
    let collection: FeatureCollection =
        serde_json::from_slice(&std::fs::read(&published.artifact_path).unwrap()).unwrap();
    assert_eq!(collection.features.len(), 1);

    let catalog = SnowlineCatalog::load(publish_dir.join("snowline.json")).unwrap();
    assert_eq!(catalog.data.len(), 1);
    assert_eq!(catalog.data[0].id, 1);
}

#[test]
fn test_stale_observations_publish_nothing() {
    let dir = scratch_dir();
    let state_path = scratch_path(&dir, "state.tar.gz");
    let state = TemporalSnowMap::new(
        grid().blank_raster(),
        DateTime::from_timestamp(1_800_000_000, 0),
    );
    save_state(&state, &state_path).unwrap();

    let observation = write_observation(
        &dir,
        "obs_20231114T221320_x.tar.gz",
        &["#####", "#####", "#####", "#####", "#####"],
    );

    let options = UpdateOptions {
        state_map: Some(state_path),
        observations: vec![observation],
        publish_dir: dir.path().join("public"),
        ..UpdateOptions::default()
    };
    let summary = UpdatePipeline::new(grid(), PublishConfig::default(), options)
        .run(now())
        .unwrap();

    assert!(!summary.merge.updated());
    assert_eq!(summary.merge.skipped_stale.len(), 1);
    assert!(summary.published.is_none());
    assert!(!dir.path().join("public").exists());
}

// ============================================================================
// State loading
// ============================================================================

#[test]
fn test_missing_state_without_blank_fails() {
    let dir = scratch_dir();
    let options = UpdateOptions {
        state_map: Some(scratch_path(&dir, "absent.tar.gz")),
        publish_dir: dir.path().join("public"),
        ..UpdateOptions::default()
    };
    let pipeline = UpdatePipeline::new(grid(), PublishConfig::default(), options);
    assert!(pipeline.load_state().is_err());
}

#[test]
fn test_corrupt_state_is_not_replaced_by_blank() {
    let dir = scratch_dir();
    let state_path = scratch_path(&dir, "state.tar.gz");
    let garbage = b"truncated upload, not gzip";
    std::fs::write(&state_path, garbage).unwrap();

    let observation = write_observation(
        &dir,
        "obs_20231114T221320_x.tar.gz",
        &["##...", "##...", ".....", ".....", "....."],
    );
    let options = UpdateOptions {
        state_map: Some(state_path.clone()),
        new_state_map: Some(state_path.clone()),
        observations: vec![observation],
        allow_blank: true,
        publish_dir: dir.path().join("public"),
        ..UpdateOptions::default()
    };

    let result = UpdatePipeline::new(grid(), PublishConfig::default(), options).run(now());
    assert!(result.is_err());
    assert_eq!(std::fs::read(&state_path).unwrap(), garbage);
}

#[test]
fn test_missing_state_with_blank_starts_blank() {
    let dir = scratch_dir();
    let options = UpdateOptions {
        state_map: Some(scratch_path(&dir, "absent.tar.gz")),
        allow_blank: true,
        publish_dir: dir.path().join("public"),
        ..UpdateOptions::default()
    };
    let pipeline = UpdatePipeline::new(grid(), PublishConfig::default(), options);
    let state = pipeline.load_state().unwrap();
    assert_eq!(state.counts().unknown, 25);
    assert!(state.get_timestamp().is_none());
}

#[test]
fn test_state_on_other_lattice_fails() {
    let dir = scratch_dir();
    let state_path = scratch_path(&dir, "state.tar.gz");
    save_state(
        &TemporalSnowMap::new(SnowRaster::from_raw(2, 2, &[0; 4], true).unwrap(), None),
        &state_path,
    )
    .unwrap();

    let options = UpdateOptions {
        state_map: Some(state_path),
        publish_dir: dir.path().join("public"),
        ..UpdateOptions::default()
    };
    let pipeline = UpdatePipeline::new(grid(), PublishConfig::default(), options);
    assert!(pipeline.load_state().is_err());
}

#[test]
fn test_dry_run_and_no_upload() {
    let dir = scratch_dir();
    let observation = write_observation(
        &dir,
        "obs_20231114T221320_x.tar.gz",
        &["##...", "##...", ".....", ".....", "....."],
    );

    let dry = UpdateOptions {
        observations: vec![observation.clone()],
        allow_blank: true,
        dry_run: true,
        publish_dir: dir.path().join("public"),
        ..UpdateOptions::default()
    };
    let summary = UpdatePipeline::new(grid(), PublishConfig::default(), dry)
        .run(now())
        .unwrap();
    assert!(!summary.published.unwrap().written);

    let no_upload = UpdateOptions {
        observations: vec![observation],
        allow_blank: true,
        no_upload: true,
        simplify: Some(0.1),
        publish_dir: dir.path().join("public"),
        ..UpdateOptions::default()
    };
    let summary = UpdatePipeline::new(grid(), PublishConfig::default(), no_upload)
        .run(now())
        .unwrap();
    assert_eq!(summary.boundaries, Some(1));
    assert!(summary.published.is_none());
    assert!(!dir.path().join("public").exists());
}
