//! Per-tile conversion from decoded samples to a single-tile raster.
//!
//! For tile `z/x/y` the converter writes, inside the run directory:
//!
//! - `z_x_y.xyz`: the point table in sample order
//! - `z_x_y_SORTED.xyz`: the same rows in raster engine order
//! - `z_x_y.tif`: the raster produced from the sorted table

use crate::coord::TileCoord;
use crate::decode::ElevationSample;
use crate::log::SharedLogger;
use crate::points::{sort_point_table, write_point_table, FieldMode};
use crate::raster::{RasterEngine, RasterHandle};
use crate::{log_debug, log_warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of one tile's trip through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TileOutcome {
    /// The tile has a raster ready for merging.
    Converted { tile: TileCoord, raster: RasterHandle },
    /// The tile was fetched, decoded or converted unsuccessfully, or never
    /// scheduled.
    Failed { tile: TileCoord, reason: String },
}

impl TileOutcome {
    pub fn tile(&self) -> TileCoord {
        match self {
            Self::Converted { tile, .. } | Self::Failed { tile, .. } => *tile,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

/// Intermediate file paths for one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePaths {
    pub points: PathBuf,
    pub sorted: PathBuf,
    pub raster: PathBuf,
}

impl TilePaths {
    pub fn new(run_dir: &Path, tile: &TileCoord) -> Self {
        let stem = tile.file_stem();
        Self {
            points: run_dir.join(format!("{}.xyz", stem)),
            sorted: run_dir.join(format!("{}_SORTED.xyz", stem)),
            raster: run_dir.join(format!("{}.tif", stem)),
        }
    }
}

/// Turns decoded samples into a single-tile raster.
pub struct TileConverter<E: RasterEngine> {
    engine: Arc<E>,
    run_dir: PathBuf,
    mode: FieldMode,
    logger: SharedLogger,
}

impl<E: RasterEngine> TileConverter<E> {
    pub fn new(engine: Arc<E>, run_dir: PathBuf, mode: FieldMode, logger: SharedLogger) -> Self {
        Self {
            engine,
            run_dir,
            mode,
            logger,
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Converts one tile. Never fails; failures become [`TileOutcome::Failed`].
    pub async fn convert(&self, samples: Vec<ElevationSample>, tile: TileCoord) -> TileOutcome {
        let paths = TilePaths::new(&self.run_dir, &tile);

        if let Err(reason) = self.write_tables(samples, &paths).await {
            log_warn!(self.logger, "Tile {}: point table failed: {}", tile, reason);
            return TileOutcome::Failed { tile, reason };
        }

        match self.engine.convert_to_raster(&paths.sorted, &paths.raster).await {
            Ok(raster) => {
                log_debug!(self.logger, "Tile {} converted to {}", tile, raster.path().display());
                TileOutcome::Converted { tile, raster }
            }
            Err(e) => {
                log_warn!(self.logger, "Tile {}: raster conversion failed: {}", tile, e);
                TileOutcome::Failed {
                    tile,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn write_tables(
        &self,
        samples: Vec<ElevationSample>,
        paths: &TilePaths,
    ) -> Result<(), String> {
        let mode = self.mode;
        let points = paths.points.clone();
        let sorted = paths.sorted.clone();

        tokio::task::spawn_blocking(move || {
            write_point_table(&points, &samples, mode)?;
            sort_point_table(&points, &sorted, mode)
        })
        .await
        .map_err(|e| format!("point table task failed: {}", e))?
        .map_err(|e| e.to_string())
    }
}
