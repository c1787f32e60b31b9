//! Mosaic pipeline.
//!
//! One run turns an extent into a single elevation raster:
//!
//! ```text
//! Extent ─► zoom ─► TileGrid ─► fetch (bounded retry) ─► decode ─► convert ─┐
//!                                                                          ▼
//!                                  output raster ◄─ merge ◄─ MosaicAssembler
//! ```
//!
//! Fetches run in grid order, at most `fetch_concurrency` at a time. Each
//! fetched tile is decoded and converted in its own task, so conversions
//! overlap with later fetches and finish in any order.

mod retry;
mod run;
mod types;

pub use retry::fetch_with_retry;
pub use run::{create_run_dir, plan_grid, Pipeline, RUN_DIR_PREFIX};
pub use types::{
    PipelineConfig, PipelineError, PipelineOptions, RunReport, DEFAULT_FETCH_CONCURRENCY,
    DEFAULT_MAX_TILES,
};
