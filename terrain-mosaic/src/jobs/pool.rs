//! Fixed-size worker pool executing pipeline runs.

use super::registry::{JobId, JobRecord, JobRegistry, JobStatus};
use crate::log::SharedLogger;
use crate::pipeline::{Pipeline, PipelineError, PipelineOptions, RunReport};
use crate::provider::AsyncHttpClient;
use crate::raster::RasterEngine;
use crate::{log_debug, log_error, log_info};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default number of concurrently running jobs.
pub const DEFAULT_WORKERS: usize = 4;

/// Errors returned by the pool.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("Job pool is shut down")]
    PoolClosed,

    #[error("Unknown job {0}")]
    UnknownJob(JobId),
}

/// Something that can execute one job's run.
pub trait JobRunner: Send + Sync + 'static {
    fn run_job(
        &self,
        options: PipelineOptions,
    ) -> impl Future<Output = Result<RunReport, PipelineError>> + Send;
}

impl<C, E> JobRunner for Pipeline<C, E>
where
    C: AsyncHttpClient + 'static,
    E: RasterEngine + 'static,
{
    fn run_job(
        &self,
        options: PipelineOptions,
    ) -> impl Future<Output = Result<RunReport, PipelineError>> + Send {
        self.run(options)
    }
}

struct QueuedJob {
    id: JobId,
    options: PipelineOptions,
}

/// Runs submitted jobs on a fixed number of workers.
///
/// Submissions beyond the worker count wait in an unbounded queue and are
/// picked up in order as workers free up.
pub struct JobPool {
    queue: mpsc::UnboundedSender<QueuedJob>,
    registry: Arc<JobRegistry>,
    workers: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
    logger: SharedLogger,
}

impl JobPool {
    /// Starts `workers` worker tasks on the current tokio runtime.
    pub fn new<R: JobRunner>(runner: Arc<R>, workers: usize, logger: SharedLogger) -> Self {
        let workers = workers.max(1);
        let (queue, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let registry = Arc::new(JobRegistry::new());
        let shutdown = CancellationToken::new();

        let handles = (0..workers)
            .map(|index| {
                tokio::spawn(worker_loop(
                    index,
                    Arc::clone(&runner),
                    Arc::clone(&rx),
                    Arc::clone(&registry),
                    shutdown.clone(),
                    Arc::clone(&logger),
                ))
            })
            .collect();

        log_info!(logger, "Job pool started with {} workers", workers);
        Self {
            queue,
            registry,
            workers: handles,
            shutdown,
            logger,
        }
    }

    /// Queues a job and returns its id immediately.
    pub fn submit(&self, options: PipelineOptions) -> Result<JobId, JobError> {
        self.submit_with(|_| options)
    }

    /// Queues a job whose options depend on its id, such as an output file
    /// named after the job.
    pub fn submit_with<F>(&self, build: F) -> Result<JobId, JobError>
    where
        F: FnOnce(&JobId) -> PipelineOptions,
    {
        if self.shutdown.is_cancelled() {
            return Err(JobError::PoolClosed);
        }

        let id = JobId::new();
        let options = build(&id);
        self.registry.insert_pending(id);
        self.queue
            .send(QueuedJob { id, options })
            .map_err(|_| JobError::PoolClosed)?;

        log_info!(self.logger, "Job {} queued", id);
        Ok(id)
    }

    pub fn status(&self, id: &JobId) -> Result<JobStatus, JobError> {
        self.registry.status(id).ok_or(JobError::UnknownJob(*id))
    }

    pub fn record(&self, id: &JobId) -> Result<JobRecord, JobError> {
        self.registry.get(id).ok_or(JobError::UnknownJob(*id))
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops taking jobs and waits for in-flight runs to finish.
    ///
    /// Jobs still queued stay `pending`.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for handle in self.workers {
            let _ = handle.await;
        }
        log_info!(self.logger, "Job pool stopped");
    }
}

async fn worker_loop<R: JobRunner>(
    index: usize,
    runner: Arc<R>,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>,
    registry: Arc<JobRegistry>,
    shutdown: CancellationToken,
    logger: SharedLogger,
) {
    loop {
        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                job = rx.recv() => job,
            }
        };
        let Some(QueuedJob { id, options }) = next else {
            break;
        };

        log_debug!(logger, "Worker {} picked up job {}", index, id);
        registry.mark_running(&id);

        let run = AssertUnwindSafe(runner.run_job(options)).catch_unwind().await;
        let result = match run {
            Ok(result) => result,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                log_error!(logger, "Job {} panicked: {}", id, reason);
                registry.mark_error(&id, format!("Job panicked: {}", reason));
                continue;
            }
        };

        match result {
            Ok(report) => {
                let message = if report.is_degraded() {
                    format!(
                        "Mosaic complete with {} of {} tiles ({} skipped)",
                        report.converted.len(),
                        report.tile_count,
                        report.skipped.len()
                    )
                } else {
                    format!("Mosaic complete with {} tiles", report.converted.len())
                };
                log_info!(logger, "Job {}: {}", id, message);
                registry.mark_complete(&id, message, report.output);
            }
            Err(e) => {
                log_error!(logger, "Job {} failed: {}", id, e);
                registry.mark_error(&id, e.to_string());
            }
        }
    }
    log_debug!(logger, "Worker {} stopped", index);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
