//! Build command - produce one elevation raster for an extent.

use std::path::PathBuf;

use tracing::{info, warn};
use terrain_mosaic::coord::Extent;
use terrain_mosaic::pipeline::PipelineOptions;
use terrain_mosaic::points::FieldMode;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the build command.
pub struct BuildArgs {
    /// `[west, south, east, north]`
    pub extent: Vec<f64>,
    pub zoom: Option<u8>,
    pub access_token: Option<String>,
    pub out_file: PathBuf,
    /// Write every sample field to the point tables
    pub full: bool,
    pub verbose: bool,
}

/// Run the build command.
pub async fn run(args: BuildArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("build");

    let extent = Extent::from_slice(&args.extent)?;
    let access_token = runner.access_token(args.access_token)?;
    let field_mode = if args.full {
        FieldMode::Full
    } else {
        runner.config().pipeline.field_mode
    };

    runner.check_tools().await?;
    let pipeline = runner.create_pipeline()?;

    let mut options = PipelineOptions::new(extent, access_token, args.out_file)
        .with_field_mode(field_mode);
    if let Some(zoom) = args.zoom {
        options = options.with_zoom(zoom);
    }

    let report = pipeline.run(options).await?;

    if report.is_degraded() {
        warn!(
            "{} of {} tiles missing from the mosaic",
            report.skipped.len(),
            report.tile_count
        );
        for skipped in &report.skipped {
            warn!("  {}: {}", skipped.tile, skipped.reason);
        }
    }
    info!(
        "Wrote {} ({} tiles at zoom {})",
        report.output.display(),
        report.converted.len(),
        report.zoom
    );
    println!("{}", report.output.display());

    Ok(())
}
