//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;

use crate::executor::TileErrorPolicy;
use crate::points::FieldMode;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Tile source settings
    pub source: SourceSettings,
    /// Per-run pipeline behaviour
    pub pipeline: PipelineSettings,
    /// External raster tools
    pub raster: RasterSettings,
    /// HTTP job service
    pub server: ServerSettings,
    /// Log output
    pub logging: LoggingSettings,
}

/// Tile source configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    /// URL template with `{z}`, `{x}`, `{y}` and optional `{access_token}`
    pub url_template: String,
    /// Access token used when none is given on the command line
    pub access_token: Option<String>,
    /// HTTP request timeout in seconds
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Attempts per tile fetch, including the first
    pub max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    /// Tiles fetched at once per run
    pub fetch_concurrency: usize,
    pub tile_error_policy: TileErrorPolicy,
    pub field_mode: FieldMode,
    /// Parent directory for per-run working directories
    pub work_dir: PathBuf,
    /// Largest padded tile grid one run accepts
    pub max_tiles: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterSettings {
    pub translate_bin: String,
    pub warp_bin: String,
    /// GDAL cache and warp memory in megabytes
    pub cache_max_mb: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub port: u16,
    /// Jobs running at once
    pub workers: usize,
    /// Directory holding finished job rasters
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
}
