//! GDAL command line raster engine.
//!
//! - Conversion: `gdal_translate <points.xyz> <tile.tif>`
//! - Merge: `gdalwarp --config GDAL_CACHEMAX <mb> -wm <mb> <inputs...> <out>`

use super::{RasterEngine, RasterError, RasterHandle};
use crate::log::SharedLogger;
use crate::{log_debug, log_error, log_info};
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;

/// Default conversion binary.
pub const DEFAULT_TRANSLATE_BIN: &str = "gdal_translate";

/// Default merge binary.
pub const DEFAULT_WARP_BIN: &str = "gdalwarp";

/// Default GDAL block cache and warp memory, in megabytes.
pub const DEFAULT_CACHE_MAX_MB: u32 = 3000;

/// Raster engine backed by the GDAL utilities.
#[derive(Clone)]
pub struct GdalEngine {
    translate_bin: String,
    warp_bin: String,
    cache_max_mb: u32,
    logger: SharedLogger,
}

impl GdalEngine {
    /// Creates an engine with the default binaries found on `PATH`.
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            translate_bin: DEFAULT_TRANSLATE_BIN.to_string(),
            warp_bin: DEFAULT_WARP_BIN.to_string(),
            cache_max_mb: DEFAULT_CACHE_MAX_MB,
            logger,
        }
    }

    pub fn with_translate_bin(mut self, bin: impl Into<String>) -> Self {
        self.translate_bin = bin.into();
        self
    }

    pub fn with_warp_bin(mut self, bin: impl Into<String>) -> Self {
        self.warp_bin = bin.into();
        self
    }

    pub fn with_cache_max_mb(mut self, mb: u32) -> Self {
        self.cache_max_mb = mb;
        self
    }

    /// Checks that both binaries can be started.
    pub async fn check_available(&self) -> Result<(), RasterError> {
        for bin in [&self.translate_bin, &self.warp_bin] {
            Command::new(bin)
                .arg("--version")
                .output()
                .await
                .map_err(|e| RasterError::Spawn {
                    tool: bin.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }

    fn merge_args(&self, inputs: &[RasterHandle], output: &Path) -> Vec<OsString> {
        let mb = self.cache_max_mb.to_string();
        let mut args: Vec<OsString> = vec![
            "--config".into(),
            "GDAL_CACHEMAX".into(),
            mb.clone().into(),
            "-wm".into(),
            mb.into(),
        ];
        args.extend(inputs.iter().map(|h| h.path().as_os_str().to_owned()));
        args.push(output.as_os_str().to_owned());
        args
    }

    async fn run(&self, bin: &str, args: &[OsString]) -> Result<(), RasterError> {
        log_debug!(
            self.logger,
            "Running {} {}",
            bin,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(bin)
            .args(args)
            .output()
            .await
            .map_err(|e| RasterError::Spawn {
                tool: bin.to_string(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log_info!(self.logger, "{}: {}", bin, stdout.trim());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log_error!(self.logger, "{} failed: {}", bin, stderr);
            return Err(RasterError::ExitStatus {
                tool: bin.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(())
    }
}

impl RasterEngine for GdalEngine {
    async fn convert_to_raster(
        &self,
        points: &Path,
        output: &Path,
    ) -> Result<RasterHandle, RasterError> {
        let args = [points.as_os_str().to_owned(), output.as_os_str().to_owned()];
        self.run(&self.translate_bin, &args).await?;
        Ok(RasterHandle::new(output))
    }

    async fn merge_rasters(
        &self,
        inputs: &[RasterHandle],
        output: &Path,
    ) -> Result<RasterHandle, RasterError> {
        let args = self.merge_args(inputs, output);
        self.run(&self.warp_bin, &args).await?;
        Ok(RasterHandle::new(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLogger;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_merge_args() {
        let engine = GdalEngine::new(crate::log::silent()).with_cache_max_mb(512);
        let args = engine.merge_args(
            &[RasterHandle::new("a.tif"), RasterHandle::new("b.tif")],
            Path::new("out.tif"),
        );
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(
            args,
            ["--config", "GDAL_CACHEMAX", "512", "-wm", "512", "a.tif", "b.tif", "out.tif"]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let engine = GdalEngine::new(crate::log::silent())
            .with_translate_bin("terrain-mosaic-no-such-tool");

        let err = engine
            .convert_to_raster(Path::new("in.xyz"), Path::new("out.tif"))
            .await
            .unwrap_err();

        assert!(err.is_missing_tool());
        assert!(engine.check_available().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_convert_runs_tool_with_input_and_output() {
        let temp = TempDir::new().unwrap();
        let points = temp.path().join("1_0_0_SORTED.xyz");
        let raster = temp.path().join("1_0_0.tif");
        std::fs::write(&points, "x,y,z\n").unwrap();

        // cp <in> <out> has the same argument shape as gdal_translate
        let engine = GdalEngine::new(crate::log::silent()).with_translate_bin("cp");
        let handle = engine.convert_to_raster(&points, &raster).await.unwrap();

        assert_eq!(handle.path(), raster.as_path());
        assert!(raster.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_captures_stderr() {
        let temp = TempDir::new().unwrap();
        let logger = Arc::new(MemoryLogger::new());
        let engine = GdalEngine::new(logger.clone()).with_translate_bin("cp");

        let err = engine
            .convert_to_raster(&temp.path().join("missing.xyz"), &temp.path().join("t.tif"))
            .await
            .unwrap_err();

        match err {
            RasterError::ExitStatus { tool, code, stderr } => {
                assert_eq!(tool, "cp");
                assert_ne!(code, Some(0));
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(logger.contains("cp failed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_merge_logs_tool_stdout() {
        let logger = Arc::new(MemoryLogger::new());
        let engine = GdalEngine::new(logger.clone()).with_warp_bin("echo");

        engine
            .merge_rasters(&[RasterHandle::new("a.tif")], Path::new("out.tif"))
            .await
            .unwrap();

        assert!(logger.contains("GDAL_CACHEMAX 3000 -wm 3000 a.tif out.tif"));
    }
}
