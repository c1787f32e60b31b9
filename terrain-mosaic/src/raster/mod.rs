//! Raster engine capability.
//!
//! The pipeline never talks to a raster tool directly. It needs two
//! operations, converting a sorted point table into a single-tile raster and
//! merging single-tile rasters into a mosaic, and gets them through
//! [`RasterEngine`]. [`GdalEngine`] implements them by running the GDAL
//! command line tools.

mod gdal;

pub use gdal::{GdalEngine, DEFAULT_CACHE_MAX_MB, DEFAULT_TRANSLATE_BIN, DEFAULT_WARP_BIN};

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a raster engine.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The tool could not be started.
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran and exited unsuccessfully.
    #[error("{tool} exited with {}: {stderr}", describe_exit(.code))]
    ExitStatus {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

impl RasterError {
    /// Returns true if the tool binary is not installed.
    pub fn is_missing_tool(&self) -> bool {
        matches!(self, Self::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// A raster file produced by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RasterHandle(PathBuf);

impl RasterHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

/// Converts point tables to rasters and merges rasters.
///
/// Implementations are shared by every concurrent conversion of a run.
pub trait RasterEngine: Send + Sync {
    /// Converts a sorted point table into a raster at `output`.
    fn convert_to_raster(
        &self,
        points: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<RasterHandle, RasterError>> + Send;

    /// Merges `inputs` into a single raster at `output`.
    fn merge_rasters(
        &self,
        inputs: &[RasterHandle],
        output: &Path,
    ) -> impl Future<Output = Result<RasterHandle, RasterError>> + Send;
}

impl<E: RasterEngine> RasterEngine for Arc<E> {
    fn convert_to_raster(
        &self,
        points: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<RasterHandle, RasterError>> + Send {
        (**self).convert_to_raster(points, output)
    }

    fn merge_rasters(
        &self,
        inputs: &[RasterHandle],
        output: &Path,
    ) -> impl Future<Output = Result<RasterHandle, RasterError>> + Send {
        (**self).merge_rasters(inputs, output)
    }
}
