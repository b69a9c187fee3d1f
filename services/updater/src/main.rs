//! Snow state updater.
//!
//! Merges classified satellite observations into the persisted snow state
//! and publishes the resulting snow boundaries as GeoJSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use snow_raster::{GeoGrid, GridConfig};
use storage::PublishConfig;
use updater::{UpdateOptions, UpdatePipeline};

#[derive(Parser, Debug)]
#[command(name = "updater")]
#[command(about = "Update the snow state map and publish snow boundaries")]
struct Args {
    /// The state map to update
    #[arg(short, long)]
    state_map: Option<PathBuf>,

    /// Where to store the new state map (not stored if omitted)
    #[arg(short, long)]
    new_state_map: Option<PathBuf>,

    /// Observation archives to merge
    #[arg(long, num_args = 1..)]
    observations: Vec<PathBuf>,

    /// Start from a blank state map if none is given or it cannot be read
    #[arg(short = 'b', long)]
    allow_blank: bool,

    /// Remove snow clusters below this pixel size
    #[arg(long, default_value_t = 0)]
    size_filter_snow: usize,

    /// Remove no-snow clusters below this pixel size
    #[arg(long, default_value_t = 0)]
    size_filter_nonsnow: usize,

    /// Let unknown pixels join clusters in the size filters
    #[arg(long)]
    include_unknown: bool,

    /// Skip the boundary calculation and publication
    #[arg(long)]
    no_boundaries: bool,

    /// Calculate boundaries but do not publish them
    #[arg(long)]
    no_upload: bool,

    /// Compute the publication without writing it
    #[arg(short, long)]
    dry_run: bool,

    /// Wipe all previous records from the catalog, use with care
    #[arg(long)]
    wipe_previous: bool,

    /// Directory receiving boundary files and the catalog
    #[arg(long, env = "SNOWLINE_PUBLISH_DIR", default_value = "./snowlines")]
    publish_dir: PathBuf,

    /// Bucket name recorded in the catalog
    #[arg(long, env = "SNOWLINE_BUCKET", default_value = "snowlines")]
    bucket: String,

    /// Lattice configuration (YAML); environment and defaults otherwise
    #[arg(long)]
    grid_config: Option<PathBuf>,

    /// Drop collinear boundary vertices with this tolerance in pixels
    #[arg(long)]
    simplify: Option<f64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.quiet {
        Level::WARN
    } else {
        match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting snow state update");

    let grid_config = match &args.grid_config {
        Some(path) => GridConfig::from_yaml(path)
            .with_context(|| format!("failed to load grid configuration {}", path.display()))?,
        None => GridConfig::from_env()?,
    };
    let grid = GeoGrid::new(grid_config)?;
    info!(
        width = grid.width(),
        height = grid.height(),
        resolution_m = grid.config().resolution_m,
        "Lattice ready"
    );

    let publish = PublishConfig {
        bucket: args.bucket,
        ..PublishConfig::default()
    };

    let options = UpdateOptions {
        state_map: args.state_map,
        new_state_map: args.new_state_map,
        observations: args.observations,
        allow_blank: args.allow_blank,
        size_filter_snow: args.size_filter_snow,
        size_filter_nonsnow: args.size_filter_nonsnow,
        include_unknown: args.include_unknown,
        no_boundaries: args.no_boundaries,
        no_upload: args.no_upload,
        dry_run: args.dry_run,
        wipe_previous: args.wipe_previous,
        publish_dir: args.publish_dir,
        simplify: args.simplify,
    };

    let summary = UpdatePipeline::new(grid, publish, options).run(Utc::now())?;

    info!(
        merged = summary.merge.merged.len(),
        stale = summary.merge.skipped_stale.len(),
        boundaries = ?summary.boundaries,
        published = ?summary.published.as_ref().map(|p| p.artifact_path.display().to_string()),
        "Done"
    );

    Ok(())
}
