//! HTTP request handlers for the job API.
//!
//! # Endpoints
//!
//! - `POST /api/job` - Submit a mosaic job
//! - `GET /api/job/{job_id}` - Query a job's status
//! - `GET /health` - Health check endpoint

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::coord::Extent;
use crate::jobs::{JobError, JobId, JobPool, JobStatus};
use crate::pipeline::{plan_grid, PipelineOptions, DEFAULT_MAX_TILES};
use crate::points::FieldMode;

/// URL prefix under which finished rasters are served.
pub const JOBS_PREFIX: &str = "/jobs";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// The access token and output directory are injected into every job; clients
/// never supply them.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<JobPool>,
    pub access_token: String,
    pub output_dir: PathBuf,
    /// Submissions whose padded grid is larger are rejected up front.
    pub max_tiles: usize,
}

impl AppState {
    pub fn new(pool: Arc<JobPool>, access_token: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            access_token: access_token.into(),
            output_dir: output_dir.into(),
            max_tiles: DEFAULT_MAX_TILES,
        }
    }

    pub fn with_max_tiles(mut self, max_tiles: usize) -> Self {
        self.max_tiles = max_tiles;
        self
    }

    fn output_file(&self, id: &JobId) -> PathBuf {
        self.output_dir.join(format!("{}.tif", id))
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /api/job`.
#[derive(Debug, Deserialize)]
pub struct JobRequest {
    /// `[west, south, east, north]` in degrees.
    pub extent: Vec<f64>,

    #[serde(default)]
    pub zoom: Option<u8>,

    /// Accepted for compatibility; service runs always write simple tables.
    #[serde(default)]
    pub simple: Option<bool>,
}

/// Response for job submission and status queries.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JobResponse {
    pub status: String,
    pub job_id: String,
    pub message: String,

    /// Download path of the finished raster.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub output: Option<String>,
}

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_request")
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Handler failures mapped to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    InvalidRequest(String),
    NotFound(String),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::InvalidRequest(m) => (StatusCode::BAD_REQUEST, "invalid_request", m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m),
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", m),
        };
        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::UnknownJob(id) => ApiError::NotFound(format!("No job with id {}", id)),
            JobError::PoolClosed => ApiError::Unavailable(err.to_string()),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Submit a mosaic job.
///
/// # Endpoint
///
/// `POST /api/job`
///
/// ```json
/// { "extent": [-1, -1, 1, 1], "zoom": 2 }
/// ```
///
/// # Response
///
/// `200 OK` with `{"status": "ok", "job_id": "...", "message": "..."}`.
///
/// # Errors
///
/// - `400 Bad Request`: malformed body or extent, unsupported zoom, or a tile
///   grid over the configured limit
/// - `503 Service Unavailable`: the pool is shutting down
pub async fn submit_job_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> Result<Json<JobResponse>, ApiError> {
    let Json(request) = payload?;
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    let extent = Extent::from_slice(&request.extent)
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let (zoom, grid) = plan_grid(&extent, request.zoom, state.max_tiles)
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let job_id = state.pool.submit_with(|id| {
        PipelineOptions::new(extent, state.access_token.clone(), state.output_file(id))
            .with_field_mode(FieldMode::Simple)
            .with_zoom(zoom)
    })?;

    info!(
        job_id = %job_id,
        extent = ?extent.to_array(),
        zoom = zoom,
        tiles = grid.len(),
        user_agent = user_agent,
        "Job submitted"
    );

    Ok(Json(JobResponse {
        status: "ok".to_string(),
        job_id: job_id.to_string(),
        message: "Job submitted".to_string(),
        output: None,
    }))
}

/// Query a job.
///
/// # Endpoint
///
/// `GET /api/job/{job_id}`
///
/// # Response
///
/// `200 OK` with `{"status": "pending|running|complete|error", "job_id": "...", "message": "..."}`;
/// completed jobs also carry `output`, the raster's download path.
///
/// # Errors
///
/// - `404 Not Found`: no job with that id
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let id: JobId = job_id.parse().map_err(|_| {
        warn!(job_id = %job_id, "Malformed job id");
        ApiError::NotFound(format!("No job with id {}", job_id))
    })?;

    let record = state.pool.record(&id)?;
    let output = (record.status == JobStatus::Complete)
        .then(|| format!("{}/{}.tif", JOBS_PREFIX, id));

    Ok(Json(JobResponse {
        status: record.status.to_string(),
        job_id: id.to_string(),
        message: record.message,
        output,
    }))
}

/// Health check.
///
/// # Endpoint
///
/// `GET /health`
///
/// ```json
/// { "status": "ok", "version": "0.1.0" }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
