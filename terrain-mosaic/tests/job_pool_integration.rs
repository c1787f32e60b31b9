//! Job pool integration tests.
//!
//! Real pipeline runs on the pool, with a mocked tile source slow enough
//! that submissions outnumbering the workers have to queue.
//!
//! Run with: `cargo test --test job_pool_integration`

mod common;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use common::{pipeline_config, solid_tile, CheckingEngine, StaticTileServer, SEA_LEVEL};
use terrain_mosaic::coord::Extent;
use terrain_mosaic::jobs::{JobId, JobPool, JobRunner, JobStatus};
use terrain_mosaic::log::silent;
use terrain_mosaic::pipeline::{Pipeline, PipelineError, PipelineOptions, RunReport};

type TestPipeline = Pipeline<StaticTileServer, Arc<CheckingEngine>>;

/// Wraps a pipeline and records how many runs overlap.
struct CountingRunner {
    pipeline: TestPipeline,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl JobRunner for CountingRunner {
    async fn run_job(&self, options: PipelineOptions) -> Result<RunReport, PipelineError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let result = self.pipeline.run(options).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn options(out: PathBuf, zoom: u8) -> PipelineOptions {
    PipelineOptions::new(Extent::new(-1.0, -1.0, 1.0, 1.0).unwrap(), "token", out).with_zoom(zoom)
}

async fn wait_terminal(pool: &JobPool, ids: &[JobId]) {
    for _ in 0..1000 {
        if ids
            .iter()
            .all(|id| pool.status(id).map(|s| s.is_terminal()).unwrap_or(false))
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("jobs did not finish");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_saturation_queues_excess_jobs() {
    let temp = TempDir::new().unwrap();
    let engine = Arc::new(CheckingEngine::default());
    let server = StaticTileServer::new(solid_tile(16, SEA_LEVEL)).with_delay(Duration::from_millis(5));
    let runner = Arc::new(CountingRunner {
        pipeline: Pipeline::new(server, Arc::clone(&engine), pipeline_config(temp.path()), silent()),
        active: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let pool = JobPool::new(Arc::clone(&runner), 2, silent());

    let ids: Vec<JobId> = (0..5)
        .map(|i| pool.submit(options(temp.path().join(format!("job_{i}.tif")), 1)).unwrap())
        .collect();

    // Only two workers exist, so at least three jobs start out queued.
    let pending = ids
        .iter()
        .filter(|id| pool.status(id) == Ok(JobStatus::Pending))
        .count();
    assert!(pending >= 3, "expected queued jobs, got {pending} pending");

    wait_terminal(&pool, &ids).await;

    assert!(runner.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(engine.merge_count(), 5);
    for (i, id) in ids.iter().enumerate() {
        let record = pool.record(id).unwrap();
        assert_eq!(record.status, JobStatus::Complete);
        let expected = temp.path().join(format!("job_{i}.tif"));
        assert_eq!(record.output.as_deref(), Some(expected.as_path()));
        assert!(expected.exists());
    }
    assert_eq!(pool.registry().stats().completed, 5);
}

#[tokio::test]
async fn test_failed_run_marks_job_error() {
    let temp = TempDir::new().unwrap();
    let server = StaticTileServer::new(solid_tile(16, SEA_LEVEL)).failing("tiles.local");
    let pipeline = Pipeline::new(
        server,
        Arc::new(CheckingEngine::default()),
        pipeline_config(temp.path()),
        silent(),
    );
    let pool = JobPool::new(Arc::new(pipeline), 1, silent());

    let id = pool.submit(options(temp.path().join("dem.tif"), 1)).unwrap();
    wait_terminal(&pool, &[id]).await;

    let record = pool.record(&id).unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert!(record.message.contains("No tiles converted"), "{}", record.message);
    assert!(record.output.is_none());
    assert_eq!(pool.registry().stats().failed, 1);
}

#[tokio::test]
async fn test_shutdown_after_jobs_finish() {
    let temp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        StaticTileServer::new(solid_tile(16, SEA_LEVEL)),
        Arc::new(CheckingEngine::default()),
        pipeline_config(temp.path()),
        silent(),
    );
    let pool = JobPool::new(Arc::new(pipeline), 1, silent());
    let id = pool.submit(options(temp.path().join("dem.tif"), 1)).unwrap();
    wait_terminal(&pool, &[id]).await;

    pool.shutdown().await;
}
