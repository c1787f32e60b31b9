//! Asynchronous job execution.
//!
//! - [`JobPool`]: a fixed number of workers, each running one pipeline run
//!   at a time
//! - [`JobRegistry`]: job id to status, `pending → running → complete | error`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use terrain_mosaic::jobs::JobPool;
//!
//! let pool = JobPool::new(Arc::new(pipeline), 4, logger);
//! let id = pool.submit(options)?;
//! println!("{}", pool.status(&id)?);
//! ```

mod pool;
mod registry;

pub use pool::{JobError, JobPool, JobRunner, DEFAULT_WORKERS};
pub use registry::{JobId, JobRecord, JobRegistry, JobStatus, RegistryStats};
