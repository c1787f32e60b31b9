//! User configuration.
//!
//! Settings are read from `~/.terrain-mosaic/config.ini`. Every key is
//! optional; a missing file yields [`ConfigFile::default`].
//!
//! # Example
//!
//! ```ignore
//! use terrain_mosaic::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let pipeline_config = config.pipeline_config();
//! ```

mod defaults;
mod file;
mod parser;
mod settings;

pub use defaults::{DEFAULT_OUTPUT_DIR, DEFAULT_SERVER_PORT};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, LoggingSettings, PipelineSettings, RasterSettings, ServerSettings, SourceSettings,
};
