//! Pipeline inputs, configuration, results and errors

use crate::coord::{CoordError, Extent, TileCoord};
use crate::executor::{RetryPolicy, TileErrorPolicy};
use crate::mosaic::{MosaicError, SkippedTile};
use crate::points::FieldMode;
use crate::provider::MAPBOX_TERRAIN_RGB;
use crate::raster::RasterError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Default number of tiles fetched at once within one run.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 1;

/// Default upper bound on the padded tile grid of one run.
pub const DEFAULT_MAX_TILES: usize = 4096;

/// Options for one mosaic run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub extent: Extent,
    /// Derived from the extent when absent.
    pub zoom: Option<u8>,
    pub access_token: String,
    /// Output raster path; `.tif` is appended if it has no raster extension.
    pub out_file: PathBuf,
    pub field_mode: FieldMode,
}

impl PipelineOptions {
    pub fn new(extent: Extent, access_token: impl Into<String>, out_file: impl Into<PathBuf>) -> Self {
        Self {
            extent,
            zoom: None,
            access_token: access_token.into(),
            out_file: out_file.into(),
            field_mode: FieldMode::Simple,
        }
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_field_mode(mut self, mode: FieldMode) -> Self {
        self.field_mode = mode;
        self
    }
}

/// Settings shared by every run of a [`super::Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tile URL template, see [`crate::provider::TileSource`].
    pub url_template: String,
    pub retry: RetryPolicy,
    pub tile_error_policy: TileErrorPolicy,
    /// Tiles fetched at once; 1 fetches strictly in sequence.
    pub fetch_concurrency: usize,
    /// Parent of the per-run working directories.
    pub work_dir: PathBuf,
    /// Largest padded grid a run accepts.
    pub max_tiles: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            url_template: MAPBOX_TERRAIN_RGB.to_string(),
            retry: RetryPolicy::default(),
            tile_error_policy: TileErrorPolicy::default(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            work_dir: std::env::temp_dir(),
            max_tiles: DEFAULT_MAX_TILES,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Path of the merged raster.
    pub output: PathBuf,
    pub zoom: u8,
    /// Number of tiles in the resolved grid.
    pub tile_count: usize,
    pub converted: Vec<TileCoord>,
    /// Tiles missing from the mosaic, with the reason.
    pub skipped: Vec<SkippedTile>,
}

impl RunReport {
    /// Returns true if some tiles are missing from the output.
    pub fn is_degraded(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed extent or unsupported zoom; raised before any I/O.
    #[error("Invalid extent: {0}")]
    InvalidExtent(#[from] CoordError),

    /// The padded grid exceeds the configured limit; raised before any I/O.
    #[error("Extent needs {tiles} tiles, limit is {limit}")]
    TooManyTiles { tiles: usize, limit: usize },

    #[error("Failed to create working directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A tile failed under [`TileErrorPolicy::Abort`].
    #[error("Tile {tile} failed: {reason}")]
    TileFailed { tile: TileCoord, reason: String },

    #[error("No tiles converted ({total} attempted)")]
    NoTilesConverted { total: usize },

    #[error("Merge failed: {0}")]
    Merge(#[source] RasterError),

    /// The run stopped before every tile reported.
    #[error("Run aborted: {0}")]
    Aborted(String),
}

impl From<MosaicError> for PipelineError {
    fn from(e: MosaicError) -> Self {
        match e {
            MosaicError::NoTilesConverted { total } => Self::NoTilesConverted { total },
            MosaicError::TileFailed { tile, reason } => Self::TileFailed { tile, reason },
            MosaicError::Merge(e) => Self::Merge(e),
        }
    }
}

impl PipelineError {
    /// Returns true if the raster engine binaries are not installed.
    pub fn is_missing_tool(&self) -> bool {
        matches!(self, Self::Merge(e) if e.is_missing_tool())
    }
}
