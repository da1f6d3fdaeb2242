//! In-memory registry for background enrichment jobs.
//!
//! Mutations that launch slow background work return a job id immediately;
//! clients poll the registry for the result. Entries move through exactly
//! one transition out of `Pending` (to `Completed` with a payload, or to
//! `Failed` without one) and are garbage-collected by a periodic sweep once
//! they outlive the retention window.
//!
//! The registry is the only writer of its map. The lock is held solely for
//! map access — never across an await point — so producers (background
//! workers) and consumers (query handlers) do not serialize each other's
//! unrelated requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub type JobId = Uuid;

/// Job lifecycle state as observed by pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
    NotFound,
}

impl JobStatus {
    /// Wire representation used by the API layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::NotFound => "NOT_FOUND",
        }
    }
}

/// Errors from state transitions. Lookups never fail; these only signal
/// programmer errors (transitioning a job that does not exist or has
/// already reached a terminal state).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job {0} already reached a terminal state")]
    AlreadyTerminal(JobId),
}

/// Poller-facing view of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub status: JobStatus,
    /// Present only when `status` is `Completed`.
    pub payload: Option<Value>,
}

#[derive(Debug, Clone)]
struct JobEntry {
    status: JobStatus,
    created_at: DateTime<Utc>,
    payload: Option<Value>,
}

/// Shared, instantiable job registry.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct JobRegistry {
    entries: Arc<Mutex<HashMap<JobId, JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new pending job and return its id immediately.
    pub fn submit(&self) -> JobId {
        let id = Uuid::new_v4();
        let entry = JobEntry {
            status: JobStatus::Pending,
            created_at: Utc::now(),
            payload: None,
        };
        self.lock().insert(id, entry);
        id
    }

    /// Transition a pending job to `Completed`, attaching its payload.
    pub fn complete(&self, id: JobId, payload: Value) -> Result<(), JobError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&id).ok_or(JobError::NotFound(id))?;
        if entry.status != JobStatus::Pending {
            return Err(JobError::AlreadyTerminal(id));
        }
        entry.status = JobStatus::Completed;
        entry.payload = Some(payload);
        Ok(())
    }

    /// Transition a pending job to `Failed`. No payload is attached;
    /// pollers must treat this as terminal.
    pub fn fail(&self, id: JobId) -> Result<(), JobError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&id).ok_or(JobError::NotFound(id))?;
        if entry.status != JobStatus::Pending {
            return Err(JobError::AlreadyTerminal(id));
        }
        entry.status = JobStatus::Failed;
        Ok(())
    }

    /// Look up the current state of a job. Unknown ids yield `NotFound`.
    pub fn get(&self, id: JobId) -> JobSnapshot {
        match self.lock().get(&id) {
            Some(entry) => JobSnapshot {
                status: entry.status,
                payload: entry.payload.clone(),
            },
            None => JobSnapshot {
                status: JobStatus::NotFound,
                payload: None,
            },
        }
    }

    /// Remove every entry older than `retention`, regardless of status.
    /// Returns the number of removed entries.
    pub fn sweep(&self, retention: Duration) -> usize {
        self.sweep_at(Utc::now(), retention)
    }

    fn sweep_at(&self, now: DateTime<Utc>, retention: Duration) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.created_at <= retention);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, JobEntry>> {
        // A poisoned lock means a panic while holding it; the map itself
        // only ever sees complete insert/update operations.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_id_is_not_found() {
        let registry = JobRegistry::new();
        assert_eq!(registry.get(Uuid::new_v4()).status, JobStatus::NotFound);
    }

    #[test]
    fn test_submit_starts_pending() {
        let registry = JobRegistry::new();
        let id = registry.submit();
        let snapshot = registry.get(id);
        assert_eq!(snapshot.status, JobStatus::Pending);
        assert_eq!(snapshot.payload, None);
    }

    #[test]
    fn test_complete_attaches_payload() {
        let registry = JobRegistry::new();
        let id = registry.submit();

        registry.complete(id, json!({"posts": []})).unwrap();

        let snapshot = registry.get(id);
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.payload, Some(json!({"posts": []})));
    }

    #[test]
    fn test_fail_has_no_payload() {
        let registry = JobRegistry::new();
        let id = registry.submit();

        registry.fail(id).unwrap();

        let snapshot = registry.get(id);
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.payload, None);
    }

    #[test]
    fn test_transitions_are_single_shot() {
        let registry = JobRegistry::new();
        let id = registry.submit();
        registry.complete(id, json!(1)).unwrap();

        assert_eq!(
            registry.complete(id, json!(2)),
            Err(JobError::AlreadyTerminal(id))
        );
        assert_eq!(registry.fail(id), Err(JobError::AlreadyTerminal(id)));
        // The original payload is untouched.
        assert_eq!(registry.get(id).payload, Some(json!(1)));
    }

    #[test]
    fn test_transition_on_missing_job_errors() {
        let registry = JobRegistry::new();
        let id = Uuid::new_v4();
        assert_eq!(
            registry.complete(id, json!(null)),
            Err(JobError::NotFound(id))
        );
        assert_eq!(registry.fail(id), Err(JobError::NotFound(id)));
    }

    #[test]
    fn test_zero_retention_sweep_clears_everything() {
        let registry = JobRegistry::new();
        let pending = registry.submit();
        let done = registry.submit();
        registry.complete(done, json!([])).unwrap();

        // Sweep at a strictly later instant so age > 0 for every entry.
        let removed =
            registry.sweep_at(Utc::now() + Duration::milliseconds(1), Duration::zero());

        assert_eq!(removed, 2);
        assert_eq!(registry.get(pending).status, JobStatus::NotFound);
        assert_eq!(registry.get(done).status, JobStatus::NotFound);
    }

    #[test]
    fn test_sweep_keeps_entries_within_retention() {
        let registry = JobRegistry::new();
        let id = registry.submit();

        let removed = registry.sweep(Duration::hours(1));

        assert_eq!(removed, 0);
        assert_eq!(registry.get(id).status, JobStatus::Pending);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = JobRegistry::new();
        let clone = registry.clone();
        let id = registry.submit();
        clone.complete(id, json!("shared")).unwrap();
        assert_eq!(registry.get(id).status, JobStatus::Completed);
    }
}
