//! Execution policies shared by the pipeline and the job pool.

mod policy;

pub use policy::{
    RetryPolicy, TileErrorPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_SECS,
};
