//! HTTP job service.
//!
//! Clients submit extents over HTTP, poll the job's status and download the
//! finished raster from the static `/jobs` prefix. The access token and the
//! output location are supplied by the server, never by the client.

pub mod handlers;
pub mod routes;

pub use handlers::{
    AppState, ApiError, ErrorResponse, HealthResponse, JobRequest, JobResponse, JOBS_PREFIX,
};
pub use routes::{create_router, RouterConfig};
