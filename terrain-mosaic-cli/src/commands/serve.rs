//! Serve command - run the HTTP job service.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use terrain_mosaic::jobs::JobPool;
use terrain_mosaic::server::{create_router, AppState, RouterConfig};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub port: Option<u16>,
    pub access_token: Option<String>,
    pub workers: Option<usize>,
    pub verbose: bool,
}

/// Run the serve command until Ctrl+C.
pub async fn run(args: ServeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("serve");
    let config = runner.config();

    // Resolve settings: CLI > config > defaults
    let access_token = runner.access_token(args.access_token)?;
    let port = args.port.unwrap_or(config.server.port);
    let workers = args.workers.unwrap_or(config.server.workers).max(1);
    let output_dir = config.server.output_dir.clone();

    std::fs::create_dir_all(&output_dir).map_err(|e| {
        CliError::Config(format!(
            "Cannot create output directory {}: {}",
            output_dir.display(),
            e
        ))
    })?;

    if let Err(e) = runner.check_tools().await {
        warn!("{}; jobs will fail until the raster tools are installed", e);
    }

    let pipeline = runner.create_pipeline()?;
    let pool = Arc::new(JobPool::new(Arc::new(pipeline), workers, runner.logger()));
    let state = AppState::new(Arc::clone(&pool), access_token, &output_dir)
        .with_max_tiles(config.pipeline.max_tiles);
    let router = create_router(state, RouterConfig::default());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(CliError::Serve)?;

    info!("Server listening on: http://{}", addr);
    info!("  Workers: {}", workers);
    info!("  Output directory: {}", output_dir.display());
    info!("  Submit a job:");
    info!(
        "    curl -X POST http://{}/api/job -H 'content-type: application/json' -d '{{\"extent\": [-1, -1, 1, 1]}}'",
        addr
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(CliError::Serve)?;

    info!("Shutting down, waiting for running jobs");
    match Arc::try_unwrap(pool) {
        Ok(pool) => pool.shutdown().await,
        Err(_) => warn!("Job pool still referenced, skipping orderly shutdown"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
