//! End-to-end pipeline runs against a mocked tile source and raster engine.
//!
//! These tests drive the full flow:
//! - extent → zoom → tile grid
//! - fetch → decode → point table → sorted table → tile raster
//! - merge → output raster, run directory removed
//!
//! Run with: `cargo test --test pipeline_integration`

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use common::{
    leftover_run_dirs, pipeline_config, solid_tile, CheckingEngine, StaticTileServer, SEA_LEVEL,
};
use terrain_mosaic::coord::Extent;
use terrain_mosaic::executor::TileErrorPolicy;
use terrain_mosaic::log::silent;
use terrain_mosaic::pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineOptions};
use terrain_mosaic::points::FieldMode;

fn equator() -> Extent {
    Extent::new(-1.0, -1.0, 1.0, 1.0).unwrap()
}

// ============================================================================
// Happy Path
// ============================================================================

#[tokio::test]
async fn test_equator_extent_at_zoom_two() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work");
    let server = Arc::new(StaticTileServer::new(solid_tile(256, SEA_LEVEL)));
    let engine = Arc::new(CheckingEngine::default());

    let pipeline = Pipeline::new(
        Arc::clone(&server),
        Arc::clone(&engine),
        pipeline_config(&work),
        silent(),
    );
    let options =
        PipelineOptions::new(equator(), "pk.secret", temp.path().join("dem.tif")).with_zoom(2);

    let report = pipeline.run(options).await.unwrap();

    // The four tiles around the origin padded by one tile on each side
    // cover the whole 4×4 grid at zoom 2.
    assert_eq!(report.zoom, 2);
    assert_eq!(report.tile_count, 16);
    assert_eq!(report.converted.len(), 16);
    assert!(!report.is_degraded());

    assert!(report.output.exists());
    assert_eq!(std::fs::read(&report.output).unwrap(), b"mosaic");
    assert_eq!(engine.merge_count(), 1);
    assert_eq!(engine.merges.lock()[0].len(), 16);
    assert!(leftover_run_dirs(&work).is_empty());

    assert_eq!(server.request_count(), 16);
    assert!(server
        .requests
        .lock()
        .iter()
        .all(|url| url.starts_with("http://tiles.local/2/") && url.ends_with("access_token=pk.secret")));
}

#[tokio::test]
async fn test_tables_are_sorted_simple_mode() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(CheckingEngine::default());
    let pipeline = Pipeline::new(
        StaticTileServer::new(solid_tile(256, SEA_LEVEL)),
        Arc::clone(&engine),
        pipeline_config(temp.path()),
        silent(),
    );
    let options =
        PipelineOptions::new(equator(), "token", temp.path().join("dem.tif")).with_zoom(2);

    pipeline.run(options).await.unwrap();

    let tables = engine.tables.lock();
    assert_eq!(tables.len(), 16);
    for table in tables.iter() {
        assert_eq!(table.header, FieldMode::Simple.header());
        assert_eq!(table.rows, 256 * 256);
        assert!(table.sorted, "rows ordered by latitude then longitude");
        assert!(table.max_abs_elevation < 1e-6, "sea level decodes to 0 m");
    }
}

#[tokio::test]
async fn test_output_extension_is_added() {
    let temp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        StaticTileServer::new(solid_tile(16, SEA_LEVEL)),
        CheckingEngine::default(),
        pipeline_config(temp.path()),
        silent(),
    );
    let options = PipelineOptions::new(equator(), "token", temp.path().join("dem")).with_zoom(1);

    let report = pipeline.run(options).await.unwrap();

    assert_eq!(report.output, temp.path().join("dem.tif"));
    assert!(report.output.exists());
}

// ============================================================================
// Tile Failures
// ============================================================================

#[tokio::test]
async fn test_failed_tile_is_skipped_and_reported() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(CheckingEngine::default());
    let pipeline = Pipeline::new(
        StaticTileServer::new(solid_tile(16, SEA_LEVEL)).failing("/2/1/1."),
        Arc::clone(&engine),
        pipeline_config(temp.path()),
        silent(),
    );
    let options =
        PipelineOptions::new(equator(), "token", temp.path().join("dem.tif")).with_zoom(2);

    let report = pipeline.run(options).await.unwrap();

    assert!(report.is_degraded());
    assert_eq!(report.converted.len(), 15);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(engine.merges.lock()[0].len(), 15);
    assert!(leftover_run_dirs(temp.path()).is_empty());
}

#[tokio::test]
async fn test_abort_policy_produces_no_output() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(CheckingEngine::default());
    let mut config = pipeline_config(temp.path());
    config.tile_error_policy = TileErrorPolicy::Abort;

    let pipeline = Pipeline::new(
        StaticTileServer::new(solid_tile(16, SEA_LEVEL)).failing("/2/0/0."),
        Arc::clone(&engine),
        config,
        silent(),
    );
    let out = temp.path().join("dem.tif");
    let options = PipelineOptions::new(equator(), "token", &out).with_zoom(2);

    let err = pipeline.run(options).await.unwrap_err();

    assert!(matches!(err, PipelineError::TileFailed { .. }), "got {err}");
    assert_eq!(engine.merge_count(), 0);
    assert!(!out.exists());
    assert!(leftover_run_dirs(temp.path()).is_empty());
}

#[tokio::test]
async fn test_invalid_zoom_is_rejected_without_requests() {
    let temp = TempDir::new().unwrap();
    let server = Arc::new(StaticTileServer::new(solid_tile(16, SEA_LEVEL)));
    let pipeline = Pipeline::new(
        Arc::clone(&server),
        CheckingEngine::default(),
        pipeline_config(temp.path()),
        silent(),
    );
    let options =
        PipelineOptions::new(equator(), "token", temp.path().join("dem.tif")).with_zoom(30);

    let err = pipeline.run(options).await.unwrap_err();

    assert!(matches!(err, PipelineError::InvalidExtent(_)));
    assert_eq!(server.request_count(), 0);
    assert!(leftover_run_dirs(temp.path()).is_empty());
}

#[tokio::test]
async fn test_grid_over_tile_limit_is_rejected_without_requests() {
    let temp = TempDir::new().unwrap();
    let server = Arc::new(StaticTileServer::new(solid_tile(16, SEA_LEVEL)));
    let pipeline = Pipeline::new(
        Arc::clone(&server),
        CheckingEngine::default(),
        PipelineConfig {
            max_tiles: 8,
            ..pipeline_config(temp.path())
        },
        silent(),
    );
    let options =
        PipelineOptions::new(equator(), "token", temp.path().join("dem.tif")).with_zoom(2);

    let err = pipeline.run(options).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::TooManyTiles {
            tiles: 16,
            limit: 8
        }
    ));
    assert_eq!(server.request_count(), 0);
    assert!(leftover_run_dirs(temp.path()).is_empty());
}

// ============================================================================
// Concurrent Runs
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_use_separate_directories() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(CheckingEngine::default());
    let pipeline = Arc::new(Pipeline::new(
        StaticTileServer::new(solid_tile(16, SEA_LEVEL)),
        Arc::clone(&engine),
        pipeline_config(temp.path()),
        silent(),
    ));

    let runs: Vec<_> = (0..4)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            let out = temp.path().join(format!("dem_{i}.tif"));
            tokio::spawn(async move {
                pipeline
                    .run(PipelineOptions::new(equator(), "token", out).with_zoom(2))
                    .await
            })
        })
        .collect();

    for run in runs {
        let report = run.await.unwrap().unwrap();
        assert_eq!(report.converted.len(), 16);
        assert!(report.output.exists());
    }
    assert_eq!(engine.merge_count(), 4);
    assert!(leftover_run_dirs(temp.path()).is_empty());
}
