//! Job registry and per-job status records.
//!
//! Each job has one record behind its own lock. The orchestrator mutates it
//! through a [`JobHandle`]; anyone else reads [`JobProgress`] snapshots.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use reelsmith_project_model::job::{Degradation, JobId, JobProgress, RenderStatus};

#[derive(Debug)]
struct JobRecord {
    progress: JobProgress,
    cancel_requested: bool,
}

/// All jobs known to this process.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Arc<Mutex<JobRecord>>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new queued job.
    pub fn create(&self) -> JobHandle {
        let id = JobId::new();
        let record = Arc::new(Mutex::new(JobRecord {
            progress: JobProgress::queued(id),
            cancel_requested: false,
        }));
        lock(&self.jobs).insert(id, Arc::clone(&record));
        tracing::debug!(job_id = %id, "Job registered");
        JobHandle { id, record }
    }

    pub fn snapshot(&self, id: JobId) -> Option<JobProgress> {
        let record = lock(&self.jobs).get(&id).cloned()?;
        let snapshot = lock(&record).progress.clone();
        Some(snapshot)
    }

    /// All jobs, oldest first.
    pub fn list(&self) -> Vec<JobProgress> {
        let records: Vec<_> = lock(&self.jobs).values().cloned().collect();
        let mut all: Vec<JobProgress> = records.iter().map(|r| lock(r).progress.clone()).collect();
        all.sort_by_key(|p| p.created_at);
        all
    }

    /// Ask a running job to stop at its next stage boundary. Returns false
    /// for unknown or already finished jobs.
    pub fn cancel(&self, id: JobId) -> bool {
        let Some(record) = lock(&self.jobs).get(&id).cloned() else {
            return false;
        };
        let mut record = lock(&record);
        if record.progress.status.is_terminal() {
            return false;
        }
        record.cancel_requested = true;
        tracing::info!(job_id = %id, "Cancellation requested");
        true
    }
}

/// Write access to one job's record.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,
    record: Arc<Mutex<JobRecord>>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn snapshot(&self) -> JobProgress {
        lock(&self.record).progress.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        lock(&self.record).cancel_requested
    }

    /// Enter a stage. Ignored once the job is terminal.
    pub fn set_status(&self, status: RenderStatus) {
        self.update(|p| {
            p.status = status;
            p.percent = p.percent.max(status.base_percent());
        });
        tracing::info!(job_id = %self.id, status = status.as_str(), "Job stage");
    }

    /// Raise the percentage; it never goes backwards.
    pub fn set_percent(&self, percent: u8) {
        self.update(|p| p.percent = p.percent.max(percent.min(99)));
    }

    pub fn degrade(&self, stage: RenderStatus, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(job_id = %self.id, stage = stage.as_str(), %reason, "Degraded");
        self.update(|p| p.degradations.push(Degradation::new(stage.as_str(), reason)));
    }

    pub fn complete(&self, output: PathBuf) {
        self.update(|p| {
            p.status = RenderStatus::Complete;
            p.percent = 100;
            p.output_ref = Some(output);
        });
    }

    pub fn fail(&self, cause: impl Into<String>) {
        let cause = cause.into();
        self.update(|p| {
            p.status = RenderStatus::Failed;
            p.percent = 100;
            p.error = Some(cause);
        });
    }

    fn update(&self, f: impl FnOnce(&mut JobProgress)) {
        let mut record = lock(&self.record);
        if record.progress.status.is_terminal() {
            return;
        }
        f(&mut record.progress);
        record.progress.updated_at = Utc::now();
    }
}

/// A poisoned lock still holds consistent progress data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_snapshots() {
        let registry = JobRegistry::new();
        let handle = registry.create();
        let id = handle.id();

        assert_eq!(registry.snapshot(id).unwrap().status, RenderStatus::Queued);

        handle.set_status(RenderStatus::Composing);
        handle.set_percent(25);
        let snap = registry.snapshot(id).unwrap();
        assert_eq!(snap.status, RenderStatus::Composing);
        assert_eq!(snap.percent, 25);

        handle.set_status(RenderStatus::Transitioning);
        handle.degrade(RenderStatus::Transitioning, "xfade failed");
        handle.complete(PathBuf::from("/renders/out.mp4"));

        let snap = registry.snapshot(id).unwrap();
        assert_eq!(snap.status, RenderStatus::Complete);
        assert_eq!(snap.percent, 100);
        assert_eq!(snap.degradations.len(), 1);
        assert!(!snap.is_clean());
        assert!(snap.updated_at >= snap.created_at);
    }

    #[test]
    fn test_percent_is_monotonic() {
        let registry = JobRegistry::new();
        let handle = registry.create();
        handle.set_status(RenderStatus::ReconcilingAudio);
        handle.set_percent(20);
        assert_eq!(handle.snapshot().percent, 65);
    }

    #[test]
    fn test_terminal_records_are_frozen() {
        let registry = JobRegistry::new();
        let handle = registry.create();
        handle.fail("cancelled");
        handle.set_status(RenderStatus::Captioning);
        handle.complete(PathBuf::from("x.mp4"));

        let snap = handle.snapshot();
        assert_eq!(snap.status, RenderStatus::Failed);
        assert_eq!(snap.error.as_deref(), Some("cancelled"));
        assert!(snap.output_ref.is_none());
        assert!(!registry.cancel(handle.id()));
    }

    #[test]
    fn test_cancel_flag() {
        let registry = JobRegistry::new();
        let handle = registry.create();
        assert!(!handle.is_cancelled());
        assert!(registry.cancel(handle.id()));
        assert!(handle.is_cancelled());
        assert!(!registry.cancel(JobId::new()));
    }

    #[test]
    fn test_jobs_are_isolated() {
        let registry = JobRegistry::new();
        let a = registry.create();
        let b = registry.create();
        a.set_status(RenderStatus::Captioning);
        assert_eq!(b.snapshot().status, RenderStatus::Queued);
        assert_eq!(registry.list().len(), 2);
        assert_ne!(a.id(), b.id());
    }
}
