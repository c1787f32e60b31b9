//! HTTP client abstraction for testability

use super::types::FetchError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent sent with every tile request.
const USER_AGENT: &str = concat!("terrain-mosaic/", env!("CARGO_PKG_VERSION"));

/// Async HTTP GET abstraction.
///
/// Allows the fetch pipeline to run against an in-memory tile source in
/// tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

impl<C: AsyncHttpClient> AsyncHttpClient for Arc<C> {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        (**self).get(url)
    }
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default 30 second timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        trace!("HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), "HTTP response received");
                resp
            }
            Err(e) => {
                warn!(
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                // reqwest includes the URL (and its access token) in Display
                return Err(FetchError::Http(format!(
                    "Request failed: {}",
                    e.without_url()
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(format!("HTTP {}", status)));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Http(format!("Failed to read response: {}", e.without_url())))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Mock HTTP client returning the same response for every request.
    pub struct MockAsyncHttpClient {
        pub response: Result<Vec<u8>, FetchError>,
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.response.clone()
        }
    }

    /// Mock HTTP client replaying a script of responses, recording each URL.
    ///
    /// Once the script runs out the last response is repeated.
    pub struct ScriptedHttpClient {
        script: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
        last: Mutex<Option<Result<Vec<u8>, FetchError>>>,
        pub requests: Mutex<Vec<String>>,
    }

    impl ScriptedHttpClient {
        pub fn new(script: Vec<Result<Vec<u8>, FetchError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    impl AsyncHttpClient for ScriptedHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.lock().push(url.to_string());
            let next = self.script.lock().pop_front();
            match next {
                Some(response) => {
                    *self.last.lock() = Some(response.clone());
                    response
                }
                None => self
                    .last
                    .lock()
                    .clone()
                    .unwrap_or_else(|| Err(FetchError::Http("empty script".into()))),
            }
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockAsyncHttpClient {
            response: Ok(vec![1, 2, 3, 4]),
        };

        let result = mock.get("http://example.com").await;
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_scripted_client_replays_and_repeats_last() {
        let mock = ScriptedHttpClient::new(vec![
            Err(FetchError::Http("HTTP 503".into())),
            Ok(vec![9]),
        ]);

        assert!(mock.get("http://a").await.is_err());
        assert_eq!(mock.get("http://b").await.unwrap(), vec![9]);
        assert_eq!(mock.get("http://c").await.unwrap(), vec![9]);
        assert_eq!(mock.request_count(), 3);
        assert_eq!(mock.requests.lock()[1], "http://b");
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(AsyncReqwestClient::with_timeout(5).is_ok());
    }
}
