//! Mosaic run orchestration.

use super::retry::fetch_with_retry;
use super::types::{PipelineConfig, PipelineError, PipelineOptions, RunReport};
use crate::convert::{TileConverter, TileOutcome};
use crate::coord::{default_zoom, Extent, TileCoord};
use crate::decode::decode_tile;
use crate::grid::{self, TileGrid};
use crate::log::SharedLogger;
use crate::mosaic::MosaicAssembler;
use crate::provider::{AsyncHttpClient, TileFetcher, TileSource};
use crate::raster::RasterEngine;
use crate::{log_debug, log_info, log_warn};
use futures::stream::{self, StreamExt};
use rand::distr::Alphanumeric;
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Prefix of every per-run working directory.
pub const RUN_DIR_PREFIX: &str = "terrain_RGB__";

const RUN_TOKEN_LEN: usize = 16;

/// Reason recorded for tiles never scheduled because the run aborted.
const NOT_SCHEDULED: &str = "not scheduled: run aborted";

/// Drives tiles through fetch, decode, convert and merge.
///
/// A pipeline is cheap to share; every [`Pipeline::run`] works in its own
/// directory and may run concurrently with others.
pub struct Pipeline<C, E>
where
    C: AsyncHttpClient + 'static,
    E: RasterEngine + 'static,
{
    client: Arc<C>,
    engine: Arc<E>,
    config: PipelineConfig,
    logger: SharedLogger,
}

impl<C, E> Pipeline<C, E>
where
    C: AsyncHttpClient + 'static,
    E: RasterEngine + 'static,
{
    pub fn new(client: C, engine: E, config: PipelineConfig, logger: SharedLogger) -> Self {
        Self {
            client: Arc::new(client),
            engine: Arc::new(engine),
            config,
            logger,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline to completion.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidExtent`] before any I/O for a bad zoom
    /// - [`PipelineError::TooManyTiles`] before any I/O for an oversized grid
    /// - [`PipelineError::WorkDir`] if the run directory cannot be created
    /// - [`PipelineError::TileFailed`] when a tile fails under the abort policy
    /// - [`PipelineError::NoTilesConverted`] when every tile failed
    /// - [`PipelineError::Merge`] when the final merge fails
    pub async fn run(&self, options: PipelineOptions) -> Result<RunReport, PipelineError> {
        let (zoom, grid) = plan_grid(&options.extent, options.zoom, self.config.max_tiles)?;
        let total = grid.len();

        log_info!(
            self.logger,
            "Extent {:?} at zoom {}: {} tiles (x {}..={}, y {}..={})",
            options.extent.to_array(),
            zoom,
            total,
            grid.min_x,
            grid.max_x,
            grid.min_y,
            grid.max_y
        );

        let run_dir = create_run_dir(&self.config.work_dir).await?;
        log_debug!(self.logger, "Run directory {}", run_dir.display());

        let policy = self.config.tile_error_policy;
        let (assembler, done) = MosaicAssembler::new(
            Arc::clone(&self.engine),
            run_dir.clone(),
            &options.out_file,
            total,
            policy,
            Arc::clone(&self.logger),
        );
        let assembler = Arc::new(assembler);
        let converter = Arc::new(TileConverter::new(
            Arc::clone(&self.engine),
            run_dir.clone(),
            options.field_mode,
            Arc::clone(&self.logger),
        ));
        let fetcher = Arc::new(TileFetcher::new(
            Arc::clone(&self.client),
            TileSource::new(self.config.url_template.clone(), options.access_token.clone()),
            Arc::clone(&self.logger),
        ));
        let aborted = Arc::new(AtomicBool::new(false));

        let retry = self.config.retry.clone();
        let logger = Arc::clone(&self.logger);
        let mut fetches = stream::iter(grid.iter())
            .map(|tile| {
                let fetcher = Arc::clone(&fetcher);
                let retry = retry.clone();
                let logger = Arc::clone(&logger);
                async move {
                    let result = fetch_with_retry(&fetcher, tile, &retry, &logger).await;
                    (tile, result)
                }
            })
            .buffered(self.config.fetch_concurrency.max(1));

        let mut scheduled = 0usize;
        while let Some((tile, result)) = fetches.next().await {
            scheduled += 1;
            match result {
                Ok(image) => {
                    let converter = Arc::clone(&converter);
                    let assembler = Arc::clone(&assembler);
                    let aborted = Arc::clone(&aborted);
                    tokio::spawn(async move {
                        let samples = decode_tile(&image, &tile);
                        drop(image);
                        let outcome = converter.convert(samples, tile).await;
                        if !outcome.is_converted() && policy.aborts() {
                            aborted.store(true, Ordering::Release);
                        }
                        assembler.record(outcome).await;
                    });
                }
                Err(e) => {
                    log_warn!(self.logger, "Tile {} not fetched: {}", tile, e);
                    assembler
                        .record(TileOutcome::Failed {
                            tile,
                            reason: e.to_string(),
                        })
                        .await;
                    if policy.aborts() {
                        aborted.store(true, Ordering::Release);
                    }
                }
            }

            if aborted.load(Ordering::Acquire) {
                break;
            }
        }
        drop(fetches);

        if scheduled < total {
            log_warn!(
                self.logger,
                "Run aborted after {} of {} tiles",
                scheduled,
                total
            );
            for tile in grid.iter().skip(scheduled) {
                record_unscheduled(&assembler, tile).await;
            }
        }

        // Conversion tasks hold the remaining references; the receiver
        // resolves once the last one reports.
        drop(assembler);
        let result = match done.await {
            Ok(result) => result.map_err(PipelineError::from),
            Err(_) => {
                cleanup_abandoned(&run_dir, &self.logger).await;
                Err(PipelineError::Aborted(
                    "a tile task ended without reporting".to_string(),
                ))
            }
        };

        let report = result?;
        log_info!(
            self.logger,
            "Run complete: {} converted, {} skipped, output {}",
            report.converted.len(),
            report.skipped.len(),
            report.output.display()
        );
        Ok(RunReport {
            output: report.output,
            zoom,
            tile_count: total,
            converted: report.converted,
            skipped: report.skipped,
        })
    }

    /// Runs the pipeline and hands the result to `callback`.
    pub async fn run_with_callback<F>(&self, options: PipelineOptions, callback: F)
    where
        F: FnOnce(Result<RunReport, PipelineError>),
    {
        callback(self.run(options).await);
    }
}

/// Picks the zoom and resolves the padded grid for one run.
///
/// Fails without touching the filesystem when the zoom is unsupported or the
/// grid holds more than `max_tiles` tiles.
pub fn plan_grid(
    extent: &Extent,
    zoom: Option<u8>,
    max_tiles: usize,
) -> Result<(u8, TileGrid), PipelineError> {
    let zoom = zoom.unwrap_or_else(|| default_zoom(extent));
    let grid = grid::resolve(extent, zoom)?;
    let tiles = grid.len();
    if tiles > max_tiles {
        return Err(PipelineError::TooManyTiles {
            tiles,
            limit: max_tiles,
        });
    }
    Ok((zoom, grid))
}

async fn record_unscheduled<E: RasterEngine>(assembler: &MosaicAssembler<E>, tile: TileCoord) {
    assembler
        .record(TileOutcome::Failed {
            tile,
            reason: NOT_SCHEDULED.to_string(),
        })
        .await;
}

async fn cleanup_abandoned(run_dir: &Path, logger: &SharedLogger) {
    if let Err(e) = tokio::fs::remove_dir_all(run_dir).await {
        if e.kind() != io::ErrorKind::NotFound {
            log_warn!(logger, "Failed to remove run directory {}: {}", run_dir.display(), e);
        }
    }
}

fn run_dir_name() -> String {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RUN_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", RUN_DIR_PREFIX, token)
}

/// Creates a fresh, uniquely named run directory under `work_dir`.
pub async fn create_run_dir(work_dir: &Path) -> Result<PathBuf, PipelineError> {
    let work_dir_error = |path: &Path, source: io::Error| PipelineError::WorkDir {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|e| work_dir_error(work_dir, e))?;

    loop {
        let candidate = work_dir.join(run_dir_name());
        match tokio::fs::create_dir(&candidate).await {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(work_dir_error(&candidate, e)),
        }
    }
}
