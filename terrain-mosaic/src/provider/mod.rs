//! Terrain-RGB tile retrieval.
//!
//! The network sits behind [`AsyncHttpClient`] so the rest of the pipeline
//! can be driven by an in-memory tile source in tests.
//!
//! - [`TileSource`]: URL template and access token
//! - [`TileFetcher`]: one request per tile, decoded into a [`TileImage`]
//! - [`AsyncReqwestClient`]: production client

mod fetcher;
pub mod http;
mod source;
mod types;

pub use fetcher::TileFetcher;
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use source::{TileSource, MAPBOX_TERRAIN_RGB};
pub use types::{FetchError, TileImage};
