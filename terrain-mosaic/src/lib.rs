//! Terrain Mosaic - elevation rasters from terrain-RGB tiles
//!
//! This library turns a geographic extent into a single elevation raster:
//! it fetches the covering terrain-RGB tiles, decodes each pixel to an
//! elevation sample, converts every tile to a raster with GDAL and merges
//! the results. Runs can be started directly through [`pipeline::Pipeline`]
//! or queued on a [`jobs::JobPool`] behind the HTTP service in [`server`].

pub mod config;
pub mod convert;
pub mod coord;
pub mod decode;
pub mod executor;
pub mod grid;
pub mod jobs;
pub mod log;
pub mod logging;
pub mod mosaic;
pub mod pipeline;
pub mod points;
pub mod provider;
pub mod raster;
pub mod server;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_not_empty() {
        assert!(!VERSION.is_empty());
    }
}
