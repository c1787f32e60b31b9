//! Provider types and errors

use crate::coord::TileCoord;
use thiserror::Error;

/// Errors that can occur while retrieving a tile image.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Network failure, timeout or non-success HTTP status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body is not a decodable image.
    #[error("Failed to decode tile {tile}: {reason}")]
    Decode { tile: TileCoord, reason: String },

    /// Every attempt allowed by the retry policy failed.
    #[error("Tile {tile} failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        tile: TileCoord,
        attempts: u32,
        last_error: String,
    },
}

impl FetchError {
    /// Returns true if another attempt could succeed.
    ///
    /// Network errors are transient; a payload that does not decode will
    /// decode no better the second time.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Http(_))
    }
}

/// A decoded tile image with random-access pixel lookup.
///
/// Owned by whoever fetched it and handed by value to the decoder.
#[derive(Debug, Clone)]
pub struct TileImage {
    pixels: image::RgbaImage,
}

impl TileImage {
    /// Decodes an encoded image payload (PNG, JPEG or WebP).
    pub fn decode(tile: TileCoord, bytes: &[u8]) -> Result<Self, FetchError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| FetchError::Decode {
            tile,
            reason: e.to_string(),
        })?;
        Ok(Self {
            pixels: decoded.to_rgba8(),
        })
    }

    /// Wraps an already decoded RGBA buffer.
    pub fn from_rgba(pixels: image::RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// RGBA channels of the pixel at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }
}
