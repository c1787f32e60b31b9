//! Bounded fetch retry.

use crate::coord::TileCoord;
use crate::executor::RetryPolicy;
use crate::log::SharedLogger;
use crate::log_warn;
use crate::provider::{AsyncHttpClient, FetchError, TileFetcher, TileImage};

/// Fetches a tile, retrying transient failures as `policy` allows.
///
/// Decode errors are returned immediately. Once the attempts run out the
/// last error is wrapped in [`FetchError::RetriesExhausted`].
pub async fn fetch_with_retry<C: AsyncHttpClient>(
    fetcher: &TileFetcher<C>,
    tile: TileCoord,
    policy: &RetryPolicy,
    logger: &SharedLogger,
) -> Result<TileImage, FetchError> {
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        let error = match fetcher.fetch(&tile).await {
            Ok(image) => return Ok(image),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => e,
        };

        match policy.delay_for_attempt(attempt) {
            Some(delay) => {
                log_warn!(
                    logger,
                    "Tile {} attempt {}/{} failed: {}; retrying in {}ms",
                    tile,
                    attempt,
                    max_attempts,
                    error,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            None => {
                return Err(FetchError::RetriesExhausted {
                    tile,
                    attempts: attempt,
                    last_error: error.to_string(),
                })
            }
        }
    }
}
