//! Terrain-RGB elevation decoding.
//!
//! Each pixel of a terrain tile packs a height into its red, green and blue
//! channels:
//!
//! ```text
//! elevation = -10000 + (R * 65536 + G * 256 + B) * 0.1
//! ```
//!
//! Pixel positions are mapped to geographic coordinates by linear
//! interpolation between the tile's corner bounds.

use crate::coord::{tile_bounds, TileCoord};
use crate::provider::TileImage;

/// Height of an all-zero pixel, in metres.
pub const ELEVATION_OFFSET: f64 = -10000.0;

/// Metres per unit of the packed 24-bit value.
pub const ELEVATION_SCALE: f64 = 0.1;

/// One decoded pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    pub tile: TileCoord,
    pub pixel_x: u32,
    pub pixel_y: u32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
}

/// Decodes a height from the three colour channels.
#[inline]
pub fn elevation_from_rgb(r: u8, g: u8, b: u8) -> f64 {
    let packed = (r as u32) * 65536 + (g as u32) * 256 + b as u32;
    ELEVATION_OFFSET + packed as f64 * ELEVATION_SCALE
}

/// Decodes every pixel of `image`, in row-major order.
///
/// Yields exactly `width * height` samples.
pub fn decode_tile(image: &TileImage, tile: &TileCoord) -> Vec<ElevationSample> {
    let bounds = tile_bounds(tile);
    let (width, height) = (image.width(), image.height());
    let lon_step = (bounds.east - bounds.west) / width.max(1) as f64;
    let lat_step = (bounds.north - bounds.south) / height.max(1) as f64;

    let mut samples = Vec::with_capacity(width as usize * height as usize);
    for pixel_y in 0..height {
        let latitude = bounds.north - pixel_y as f64 * lat_step;
        for pixel_x in 0..width {
            let [r, g, b, a] = image.pixel(pixel_x, pixel_y);
            samples.push(ElevationSample {
                tile: *tile,
                pixel_x,
                pixel_y,
                r,
                g,
                b,
                a,
                longitude: bounds.west + pixel_x as f64 * lon_step,
                latitude,
                elevation: elevation_from_rgb(r, g, b),
            });
        }
    }
    samples
}
