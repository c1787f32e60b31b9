//! Shared fixtures for the integration tests.
//!
//! Each test binary compiles this module separately, so not every helper is
//! used everywhere.
#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use image::{ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;

use terrain_mosaic::executor::RetryPolicy;
use terrain_mosaic::pipeline::{PipelineConfig, RUN_DIR_PREFIX};
use terrain_mosaic::provider::{AsyncHttpClient, FetchError};
use terrain_mosaic::raster::{RasterEngine, RasterError, RasterHandle};

/// RGB for sea level: -10000 + (1*65536 + 134*256 + 160) * 0.1 = 0.
pub const SEA_LEVEL: [u8; 4] = [1, 134, 160, 255];

/// Encodes a solid `size`×`size` terrain-RGB tile.
pub fn solid_tile(size: u32, pixel: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(size, size, Rgba(pixel));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Serves the same tile for every URL, optionally after a delay.
pub struct StaticTileServer {
    body: Vec<u8>,
    delay: Duration,
    failing: Option<String>,
    pub requests: Mutex<Vec<String>>,
}

impl StaticTileServer {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            delay: Duration::ZERO,
            failing: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fails every request whose URL contains `fragment`.
    pub fn failing(mut self, fragment: impl Into<String>) -> Self {
        self.failing = Some(fragment.into());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl AsyncHttpClient for StaticTileServer {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().push(url.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.failing {
            Some(fragment) if url.contains(fragment.as_str()) => {
                Err(FetchError::Http("503 Service Unavailable".to_string()))
            }
            _ => Ok(self.body.clone()),
        }
    }
}

/// Raster engine that checks its inputs and writes placeholder files.
///
/// Every sorted point table handed to `convert_to_raster` is inspected: its
/// header, its row count and its latitude-then-longitude order.
#[derive(Default)]
pub struct CheckingEngine {
    pub tables: Mutex<Vec<TableSummary>>,
    pub merges: Mutex<Vec<Vec<PathBuf>>>,
    pub converts: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct TableSummary {
    pub header: String,
    pub rows: usize,
    pub sorted: bool,
    pub max_abs_elevation: f64,
}

impl CheckingEngine {
    pub fn merge_count(&self) -> usize {
        self.merges.lock().len()
    }
}

impl RasterEngine for CheckingEngine {
    async fn convert_to_raster(
        &self,
        points: &Path,
        output: &Path,
    ) -> Result<RasterHandle, RasterError> {
        let content = std::fs::read_to_string(points).map_err(|source| RasterError::Io {
            path: points.to_path_buf(),
            source,
        })?;
        self.tables.lock().push(summarize(&content));
        self.converts.fetch_add(1, Ordering::SeqCst);

        std::fs::write(output, b"tile").map_err(|source| RasterError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        Ok(RasterHandle::new(output))
    }

    async fn merge_rasters(
        &self,
        inputs: &[RasterHandle],
        output: &Path,
    ) -> Result<RasterHandle, RasterError> {
        assert!(inputs.iter().all(|h| h.path().exists()));
        self.merges
            .lock()
            .push(inputs.iter().map(|h| h.path().to_path_buf()).collect());
        std::fs::write(output, b"mosaic").map_err(|source| RasterError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        Ok(RasterHandle::new(output))
    }
}

/// Summarizes a simple-mode table (`x,y,z`).
fn summarize(content: &str) -> TableSummary {
    let mut lines = content.lines();
    let header = lines.next().unwrap_or_default().to_string();

    let rows: Vec<(f64, f64, f64)> = lines
        .filter(|l| !l.is_empty())
        .map(|l| {
            let cols: Vec<f64> = l.split(',').map(|c| c.parse().unwrap()).collect();
            (cols[0], cols[1], cols[2])
        })
        .collect();

    let sorted = rows.windows(2).all(|w| {
        let (lon_a, lat_a, _) = w[0];
        let (lon_b, lat_b, _) = w[1];
        lat_a < lat_b || (lat_a == lat_b && lon_a <= lon_b)
    });
    let max_abs_elevation = rows.iter().map(|r| r.2.abs()).fold(0.0, f64::max);

    TableSummary {
        header,
        rows: rows.len(),
        sorted,
        max_abs_elevation,
    }
}

pub fn pipeline_config(work_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        url_template: "http://tiles.local/{z}/{x}/{y}.pngraw?access_token={access_token}".into(),
        retry: RetryPolicy::fixed(2, Duration::from_millis(1)),
        work_dir: work_dir.to_path_buf(),
        ..PipelineConfig::default()
    }
}

/// Run directories left under `work_dir`.
pub fn leftover_run_dirs(work_dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(work_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(RUN_DIR_PREFIX))
                })
                .collect()
        })
        .unwrap_or_default()
}
