//! Single-attempt tile retrieval.

use super::http::AsyncHttpClient;
use super::source::TileSource;
use super::types::{FetchError, TileImage};
use crate::coord::TileCoord;
use crate::log::SharedLogger;
use crate::{log_debug, log_trace};

/// Downloads one tile and decodes it into a [`TileImage`].
///
/// Makes exactly one request per call. Retrying is the caller's decision,
/// see [`crate::executor::RetryPolicy`].
pub struct TileFetcher<C: AsyncHttpClient> {
    client: C,
    source: TileSource,
    logger: SharedLogger,
}

impl<C: AsyncHttpClient> TileFetcher<C> {
    pub fn new(client: C, source: TileSource, logger: SharedLogger) -> Self {
        Self {
            client,
            source,
            logger,
        }
    }

    pub fn source(&self) -> &TileSource {
        &self.source
    }

    /// Fetches and decodes a tile.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] for network, timeout or status failures
    /// - [`FetchError::Decode`] when the payload is not an image
    pub async fn fetch(&self, tile: &TileCoord) -> Result<TileImage, FetchError> {
        log_debug!(self.logger, "Fetching {}", self.source.redacted_url(tile));

        let bytes = self.client.get(&self.source.tile_url(tile)).await?;
        log_trace!(self.logger, "Tile {} payload: {} bytes", tile, bytes.len());

        TileImage::decode(*tile, &bytes)
    }
}
