//! Terrain-RGB tile source.
//!
//! A source is a URL template with `{z}`, `{x}`, `{y}` and optionally
//! `{access_token}` placeholders.
//!
//! # URL Pattern
//!
//! `https://api.mapbox.com/v4/mapbox.terrain-rgb/{z}/{x}/{y}.pngraw?access_token={access_token}`
//!
//! - Standard XYZ tile coordinates (x = column, y = row)
//! - Requires an access token
//! - `pngraw` is lossless; lossy encodings corrupt the elevation channels

use crate::coord::TileCoord;

/// Mapbox Terrain-RGB v1 tiles.
pub const MAPBOX_TERRAIN_RGB: &str =
    "https://api.mapbox.com/v4/mapbox.terrain-rgb/{z}/{x}/{y}.pngraw?access_token={access_token}";

const TOKEN_PLACEHOLDER: &str = "{access_token}";

/// Replacement for the token in URLs that end up in logs.
const REDACTED: &str = "***";

/// A tile URL template plus the credential it is requested with.
#[derive(Debug, Clone)]
pub struct TileSource {
    template: String,
    access_token: String,
}

impl TileSource {
    /// Creates a source from an arbitrary URL template.
    pub fn new(template: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            access_token: access_token.into(),
        }
    }

    /// The Mapbox Terrain-RGB source.
    pub fn mapbox(access_token: impl Into<String>) -> Self {
        Self::new(MAPBOX_TERRAIN_RGB, access_token)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Builds the request URL for a tile.
    ///
    /// A template without an `{access_token}` placeholder gets the token
    /// appended as an `access_token` query parameter.
    pub fn tile_url(&self, tile: &TileCoord) -> String {
        self.render(tile, &self.access_token)
    }

    /// Request URL with the token masked, for logging.
    pub fn redacted_url(&self, tile: &TileCoord) -> String {
        if self.access_token.is_empty() {
            self.render(tile, "")
        } else {
            self.render(tile, REDACTED)
        }
    }

    fn render(&self, tile: &TileCoord, token: &str) -> String {
        let url = self
            .template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string());

        if self.template.contains(TOKEN_PLACEHOLDER) {
            return url.replace(TOKEN_PLACEHOLDER, token);
        }
        if token.is_empty() {
            return url;
        }

        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}access_token={}", url, separator, token)
    }
}
