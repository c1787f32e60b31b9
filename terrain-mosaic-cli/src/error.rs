//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use terrain_mosaic::config::ConfigFileError;
use terrain_mosaic::coord::CoordError;
use terrain_mosaic::pipeline::PipelineError;
use terrain_mosaic::provider::FetchError;
use terrain_mosaic::raster::RasterError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Bad command-line arguments
    InvalidArgs(String),
    /// Failed to create the HTTP client
    HttpClient(FetchError),
    /// Raster tools unusable
    Raster(RasterError),
    /// A mosaic run failed
    Build(PipelineError),
    /// HTTP service error
    Serve(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        let missing_tool = match self {
            CliError::Raster(e) => e.is_missing_tool(),
            CliError::Build(e) => e.is_missing_tool(),
            _ => false,
        };
        if missing_tool {
            eprintln!();
            eprintln!("GDAL command line tools not found. Install them with:");
            eprintln!("  sudo apt install gdal-bin (Debian/Ubuntu)");
            eprintln!("  brew install gdal (macOS)");
            eprintln!("or set translate_bin and warp_bin under [raster] in config.ini");
        }

        match self {
            CliError::Build(PipelineError::NoTilesConverted { .. }) => {
                eprintln!();
                eprintln!("No tile could be downloaded. Check that:");
                eprintln!("  1. Your access token is valid");
                eprintln!("  2. The url_template in config.ini points at a terrain-RGB source");
            }
            CliError::Build(PipelineError::TooManyTiles { .. }) => {
                eprintln!();
                eprintln!("Pass a lower --zoom, shrink the extent, or raise max_tiles under");
                eprintln!("[pipeline] in config.ini");
            }
            CliError::Serve(_) => {
                eprintln!();
                eprintln!("Is another process already listening on that port?");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Raster(e) => write!(f, "Raster tools unavailable: {}", e),
            CliError::Build(e) => write!(f, "Mosaic failed: {}", e),
            CliError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::HttpClient(e) => Some(e),
            CliError::Raster(e) => Some(e),
            CliError::Build(e) => Some(e),
            CliError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::InvalidArgs(e.to_string())
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Build(e)
    }
}

impl From<RasterError> for CliError {
    fn from(e: RasterError) -> Self {
        CliError::Raster(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::HttpClient(e)
    }
}
