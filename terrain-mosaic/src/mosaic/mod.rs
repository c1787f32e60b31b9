//! Mosaic assembly.
//!
//! Every tile of a run reports its [`TileOutcome`] to one shared
//! [`MosaicAssembler`]. The report that brings the completion count to the
//! run's tile total performs the final step exactly once:
//!
//! 1. merge the converted tiles into the output raster (unless the run was
//!    aborted or nothing converted)
//! 2. delete the run directory, whether or not the merge succeeded
//! 3. send the result to whoever holds the completion receiver

use crate::convert::TileOutcome;
use crate::coord::TileCoord;
use crate::executor::TileErrorPolicy;
use crate::log::SharedLogger;
use crate::raster::{RasterEngine, RasterError, RasterHandle};
use crate::{log_error, log_info, log_warn};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

/// Extension appended to output paths without a recognised raster extension.
pub const DEFAULT_RASTER_EXTENSION: &str = "tif";

/// Why a run produced no mosaic.
#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("No tiles converted ({total} attempted)")]
    NoTilesConverted { total: usize },

    #[error("Tile {tile} failed: {reason}")]
    TileFailed { tile: TileCoord, reason: String },

    #[error("Merge failed: {0}")]
    Merge(#[source] RasterError),
}

/// A tile left out of the mosaic.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTile {
    pub tile: TileCoord,
    pub reason: String,
}

/// A successfully merged mosaic.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicReport {
    pub output: PathBuf,
    pub converted: Vec<TileCoord>,
    pub skipped: Vec<SkippedTile>,
}

impl MosaicReport {
    /// Returns true if any tile is missing from the mosaic.
    pub fn is_degraded(&self) -> bool {
        !self.skipped.is_empty()
    }
}

pub type MosaicResult = Result<MosaicReport, MosaicError>;

/// Returns `path` with `.tif` appended unless it already ends in `.tif` or
/// `.tiff` (any case).
pub fn with_raster_extension(path: &Path) -> PathBuf {
    let recognised = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
        .unwrap_or(false);

    if recognised {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(DEFAULT_RASTER_EXTENSION);
        PathBuf::from(name)
    }
}

/// Collects per-tile outcomes and triggers the merge once all are in.
pub struct MosaicAssembler<E: RasterEngine> {
    engine: Arc<E>,
    run_dir: PathBuf,
    output: PathBuf,
    total: usize,
    policy: TileErrorPolicy,
    completed: AtomicUsize,
    outcomes: Mutex<Vec<TileOutcome>>,
    done: Mutex<Option<oneshot::Sender<MosaicResult>>>,
    logger: SharedLogger,
}

impl<E: RasterEngine> MosaicAssembler<E> {
    /// Creates an assembler expecting `total` tile reports.
    ///
    /// The output path gets a default raster extension if needed. The
    /// returned receiver resolves once the run is finished.
    pub fn new(
        engine: Arc<E>,
        run_dir: PathBuf,
        output: &Path,
        total: usize,
        policy: TileErrorPolicy,
        logger: SharedLogger,
    ) -> (Self, oneshot::Receiver<MosaicResult>) {
        let (tx, rx) = oneshot::channel();
        let assembler = Self {
            engine,
            run_dir,
            output: with_raster_extension(output),
            total,
            policy,
            completed: AtomicUsize::new(0),
            outcomes: Mutex::new(Vec::new()),
            done: Mutex::new(Some(tx)),
            logger,
        };
        (assembler, rx)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire).min(self.total)
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Records one tile's outcome.
    ///
    /// The call that completes the run performs the merge and cleanup before
    /// returning. Reports beyond the total are logged and ignored.
    pub async fn record(&self, outcome: TileOutcome) {
        self.outcomes.lock().push(outcome);

        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if done == self.total {
            let result = self.finish().await;
            self.signal(result);
        } else if done > self.total {
            log_error!(
                self.logger,
                "Tile report {} exceeds run total {}, ignored",
                done,
                self.total
            );
        }
    }

    async fn finish(&self) -> MosaicResult {
        let outcomes = std::mem::take(&mut *self.outcomes.lock());
        let result = self.merge(outcomes).await;
        self.cleanup().await;
        result
    }

    async fn merge(&self, outcomes: Vec<TileOutcome>) -> MosaicResult {
        let mut converted: Vec<(TileCoord, RasterHandle)> = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                TileOutcome::Converted { tile, raster } => converted.push((tile, raster)),
                TileOutcome::Failed { tile, reason } => skipped.push(SkippedTile { tile, reason }),
            }
        }
        converted.sort_by_key(|(tile, _)| *tile);
        skipped.sort_by_key(|s| s.tile);

        if self.policy.aborts() {
            if let Some(first) = skipped.first() {
                log_warn!(self.logger, "Run aborted, {} tile(s) not converted", skipped.len());
                return Err(MosaicError::TileFailed {
                    tile: first.tile,
                    reason: first.reason.clone(),
                });
            }
        }

        if converted.is_empty() {
            return Err(MosaicError::NoTilesConverted { total: self.total });
        }

        for s in &skipped {
            log_warn!(self.logger, "Tile {} missing from mosaic: {}", s.tile, s.reason);
        }

        let handles: Vec<RasterHandle> = converted.iter().map(|(_, h)| h.clone()).collect();
        log_info!(
            self.logger,
            "Merging {} tile(s) into {}",
            handles.len(),
            self.output.display()
        );

        let merged = self
            .engine
            .merge_rasters(&handles, &self.output)
            .await
            .map_err(MosaicError::Merge)?;

        log_info!(self.logger, "Mosaic written to {}", merged.path().display());
        Ok(MosaicReport {
            output: merged.into_path(),
            converted: converted.into_iter().map(|(tile, _)| tile).collect(),
            skipped,
        })
    }

    async fn cleanup(&self) {
        match tokio::fs::remove_dir_all(&self.run_dir).await {
            Ok(()) => log_info!(self.logger, "Removed run directory {}", self.run_dir.display()),
            Err(e) => log_warn!(
                self.logger,
                "Failed to remove run directory {}: {}",
                self.run_dir.display(),
                e
            ),
        }
    }

    fn signal(&self, result: MosaicResult) {
        if let Some(tx) = self.done.lock().take() {
            // Receiver dropped means nobody is waiting on the run
            let _ = tx.send(result);
        }
    }
}
