//! Job registry.
//!
//! Maps job identity to status for every job submitted to a
//! [`super::JobPool`]. Records are kept for the life of the process.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Opaque unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle of a job: `pending → running → complete | error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    /// Returns true once the job will not change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    /// Human readable progress or failure description.
    pub message: String,
    /// Path of the merged raster once complete.
    pub output: Option<PathBuf>,
}

/// Job counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Concurrent map of job id to record.
///
/// Only the pool inserts records and only the worker running a job moves
/// its status forward.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: DashMap<JobId, JobRecord>,
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for `id`.
    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.jobs.get(id).map(|entry| entry.status)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn insert_pending(&self, id: JobId) {
        self.jobs.insert(
            id,
            JobRecord {
                id,
                status: JobStatus::Pending,
                message: "Job queued".to_string(),
                output: None,
            },
        );
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn mark_running(&self, id: &JobId) {
        self.update(id, JobStatus::Running, "Job running".to_string(), None);
    }

    pub(crate) fn mark_complete(&self, id: &JobId, message: String, output: PathBuf) {
        if self.update(id, JobStatus::Complete, message, Some(output)) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn mark_error(&self, id: &JobId, message: String) {
        if self.update(id, JobStatus::Error, message, None) {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Moves a job forward. Terminal records are never rewritten.
    fn update(
        &self,
        id: &JobId,
        status: JobStatus,
        message: String,
        output: Option<PathBuf>,
    ) -> bool {
        match self.jobs.get_mut(id) {
            Some(mut entry) if !entry.status.is_terminal() => {
                entry.status = status;
                entry.message = message;
                entry.output = output;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique_and_parse() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<JobId>().unwrap(), a);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&JobStatus::Complete).unwrap(), "\"complete\"");
        assert_eq!(JobStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_lifecycle() {
        let registry = JobRegistry::new();
        let id = JobId::new();

        registry.insert_pending(id);
        assert_eq!(registry.status(&id), Some(JobStatus::Pending));

        registry.mark_running(&id);
        assert_eq!(registry.status(&id), Some(JobStatus::Running));

        registry.mark_complete(&id, "done".into(), PathBuf::from("/tiffs/x.tif"));
        let record = registry.get(&id).unwrap();
        assert_eq!(record.status, JobStatus::Complete);
        assert_eq!(record.output, Some(PathBuf::from("/tiffs/x.tif")));
        assert_eq!(registry.stats().completed, 1);
    }

    #[test]
    fn test_terminal_status_is_final() {
        let registry = JobRegistry::new();
        let id = JobId::new();
        registry.insert_pending(id);
        registry.mark_error(&id, "merge failed".into());

        registry.mark_running(&id);
        registry.mark_complete(&id, "late".into(), PathBuf::from("x.tif"));

        let record = registry.get(&id).unwrap();
        assert_eq!(record.status, JobStatus::Error);
        assert_eq!(record.message, "merge failed");
        assert_eq!(registry.stats(), RegistryStats { submitted: 1, completed: 0, failed: 1 });
    }

    #[test]
    fn test_unknown_id() {
        let registry = JobRegistry::new();
        assert!(registry.get(&JobId::new()).is_none());
        assert!(registry.is_empty());
    }
}
