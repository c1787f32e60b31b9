//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and pipeline
//! construction so each command handler only deals with its own flags.

use crate::error::CliError;
use std::sync::Arc;
use tracing::info;
use terrain_mosaic::config::ConfigFile;
use terrain_mosaic::log::{SharedLogger, TracingLogger};
use terrain_mosaic::logging::{default_log_file, init_logging, LoggingGuard};
use terrain_mosaic::pipeline::Pipeline;
use terrain_mosaic::provider::AsyncReqwestClient;
use terrain_mosaic::raster::GdalEngine;

/// Pipeline wired to the network and the GDAL tools.
pub type GdalPipeline = Pipeline<AsyncReqwestClient, GdalEngine>;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    logger: SharedLogger,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `verbose` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let logging_guard =
            init_logging(&config.logging.directory, default_log_file(), true, verbose)
                .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            logger: Arc::new(TracingLogger::new()),
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn logger(&self) -> SharedLogger {
        Arc::clone(&self.logger)
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Terrain Mosaic v{}", terrain_mosaic::VERSION);
        info!("Terrain Mosaic CLI: {} command", command);
    }

    /// Resolve the access token: CLI flag, then config.
    pub fn access_token(&self, cli_token: Option<String>) -> Result<String, CliError> {
        cli_token
            .or_else(|| self.config.source.access_token.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                CliError::Config(
                    "An access token is required. \
                     Use --access-token or set access_token under [source] in config.ini"
                        .to_string(),
                )
            })
    }

    /// Fail early if the configured GDAL tools cannot be started.
    pub async fn check_tools(&self) -> Result<(), CliError> {
        self.config.gdal_engine(self.logger()).check_available().await?;
        info!(
            "Raster tools: {}, {}",
            self.config.raster.translate_bin, self.config.raster.warp_bin
        );
        Ok(())
    }

    /// Create a pipeline from the loaded configuration.
    pub fn create_pipeline(&self) -> Result<GdalPipeline, CliError> {
        let client = AsyncReqwestClient::with_timeout(self.config.source.timeout)?;
        let engine = self.config.gdal_engine(self.logger());

        info!(
            "Pipeline: {} fetch(es) at once, tile errors: {}, retries: {}",
            self.config.pipeline.fetch_concurrency,
            self.config.pipeline.tile_error_policy,
            self.config.pipeline.max_attempts
        );

        Ok(Pipeline::new(
            client,
            engine,
            self.config.pipeline_config(),
            self.logger(),
        ))
    }
}
