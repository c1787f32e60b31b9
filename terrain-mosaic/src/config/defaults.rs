//! Default values for all configuration settings.

use std::path::PathBuf;

use super::settings::*;
use crate::executor::{TileErrorPolicy, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS};
use crate::jobs::DEFAULT_WORKERS;
use crate::logging::default_log_dir;
use crate::pipeline::{DEFAULT_FETCH_CONCURRENCY, DEFAULT_MAX_TILES};
use crate::points::FieldMode;
use crate::provider::{DEFAULT_TIMEOUT_SECS, MAPBOX_TERRAIN_RGB};
use crate::raster::{DEFAULT_CACHE_MAX_MB, DEFAULT_TRANSLATE_BIN, DEFAULT_WARP_BIN};

/// Default HTTP service port.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default directory for finished job rasters.
pub const DEFAULT_OUTPUT_DIR: &str = "tiffs";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            source: SourceSettings {
                url_template: MAPBOX_TERRAIN_RGB.to_string(),
                access_token: None,
                timeout: DEFAULT_TIMEOUT_SECS,
            },
            pipeline: PipelineSettings {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                retry_initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
                fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
                tile_error_policy: TileErrorPolicy::default(),
                field_mode: FieldMode::default(),
                work_dir: std::env::temp_dir(),
                max_tiles: DEFAULT_MAX_TILES,
            },
            raster: RasterSettings {
                translate_bin: DEFAULT_TRANSLATE_BIN.to_string(),
                warp_bin: DEFAULT_WARP_BIN.to_string(),
                cache_max_mb: DEFAULT_CACHE_MAX_MB,
            },
            server: ServerSettings {
                port: DEFAULT_SERVER_PORT,
                workers: DEFAULT_WORKERS,
                output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            },
            logging: LoggingSettings {
                directory: PathBuf::from(default_log_dir()),
            },
        }
    }
}
