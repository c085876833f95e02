//! In-memory registry of in-flight jobs.
//!
//! Entries exist only while a run is active and are never persisted; the
//! catalog stays the single source of truth for completed videos.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

use super::types::PipelineStage;

/// Snapshot of an in-flight job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveJob {
    pub id: String,
    pub original_name: String,
    pub stage: PipelineStage,
    /// Last reported progress, once encoding has reported any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f32>,
    pub strategy: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry {
    job: ActiveJob,
    cancel: CancellationToken,
}

/// Shared registry of running jobs. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, Entry>>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the map itself consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a job. It stays listed until the returned guard is dropped.
    pub fn register(&self, job: ActiveJob, cancel: CancellationToken) -> TrackedJob {
        let id = job.id.clone();
        self.write().insert(id.clone(), Entry { job, cancel });
        TrackedJob {
            tracker: self.clone(),
            id,
        }
    }

    /// In-flight jobs, oldest first.
    pub fn list(&self) -> Vec<ActiveJob> {
        let mut jobs: Vec<_> = self.read().values().map(|e| e.job.clone()).collect();
        jobs.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    pub fn get(&self, id: &str) -> Option<ActiveJob> {
        self.read().get(id).map(|e| e.job.clone())
    }

    /// Requests cancellation of a job. Returns false if it isn't running.
    pub fn cancel(&self, id: &str) -> bool {
        match self.read().get(id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut ActiveJob)) {
        if let Some(entry) = self.write().get_mut(id) {
            f(&mut entry.job);
        }
    }
}

/// Guard for a registered job; removes it from the tracker on drop.
#[derive(Debug)]
pub struct TrackedJob {
    tracker: JobTracker,
    id: String,
}

impl TrackedJob {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_stage(&self, stage: PipelineStage) {
        self.tracker.update(&self.id, |job| job.stage = stage);
    }

    pub fn set_percent(&self, percent: f32) {
        self.tracker.update(&self.id, |job| job.percent = Some(percent));
    }
}

impl Drop for TrackedJob {
    fn drop(&mut self) {
        self.tracker.write().remove(&self.id);
    }
}
