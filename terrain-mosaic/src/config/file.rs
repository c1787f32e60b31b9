//! Configuration file handling for ~/.terrain-mosaic/config.ini.
//!
//! Loads user configuration with sensible defaults. Settings structs live in
//! [`super::settings`], constants in [`super::defaults`] and parsing in
//! [`super::parser`].

use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::executor::RetryPolicy;
use crate::log::SharedLogger;
use crate::pipeline::PipelineConfig;
use crate::raster::GdalEngine;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load configuration from the default path (~/.terrain-mosaic/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Pipeline settings for every run started from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let retry = RetryPolicy::exponential(self.pipeline.max_attempts).with_initial_delay(
            Duration::from_millis(self.pipeline.retry_initial_delay_ms),
        );

        PipelineConfig {
            url_template: self.source.url_template.clone(),
            retry,
            tile_error_policy: self.pipeline.tile_error_policy,
            fetch_concurrency: self.pipeline.fetch_concurrency,
            work_dir: self.pipeline.work_dir.clone(),
            max_tiles: self.pipeline.max_tiles,
        }
    }

    /// Raster engine configured with the `[raster]` tools.
    pub fn gdal_engine(&self, logger: SharedLogger) -> GdalEngine {
        GdalEngine::new(logger)
            .with_translate_bin(self.raster.translate_bin.clone())
            .with_warp_bin(self.raster.warp_bin.clone())
            .with_cache_max_mb(self.raster.cache_max_mb)
    }
}

/// Get the path to the config directory (~/.terrain-mosaic).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".terrain-mosaic")
}

/// Get the path to the config file (~/.terrain-mosaic/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
