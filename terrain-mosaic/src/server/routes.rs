//! Router configuration for the job service.
//!
//! # Route Structure
//!
//! ```text
//! /health                 - Health check
//! /api/job                - Submit a job (POST)
//! /api/job/{job_id}       - Job status (GET)
//! /jobs/{job_id}.tif      - Finished rasters (static)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use terrain_mosaic::server::{create_router, AppState, RouterConfig};
//!
//! let state = AppState::new(pool, token, "./tiffs");
//! let router = create_router(state, RouterConfig::default());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, job_status_handler, submit_job_handler, AppState, JOBS_PREFIX,
};

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

/// Create the application router.
///
/// Completed rasters are served from `state.output_dir` under `/jobs`.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let outputs = ServeDir::new(&state.output_dir);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/job", post(submit_job_handler))
        .route("/api/job/{job_id}", get(job_status_handler))
        .nest_service(JOBS_PREFIX, outputs)
        .with_state(state);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
