//! Task registry - the authoritative, ordered collection of download tasks.
//!
//! The registry is the single source of truth for task state. It is owned by
//! the [`HttpDownloader`](crate::HttpDownloader) and mutated only through the
//! coordinator in response to transfer events; consumers observe it through
//! detached [`TaskSnapshot`] views.
//!
//! Invariants enforced here rather than trusted from callers:
//! - task IDs are unique; inserting a duplicate fails
//! - terminal tasks (completed/failed) never change again
//! - `transferred_bytes` never decreases and `progress_percent` never
//!   exceeds 100
//! - updates for a removed task are discarded, never resurrected

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::types::{Status, TaskId, TaskSnapshot};

/// A download task as owned by the registry
#[derive(Clone, Debug)]
pub struct DownloadTask {
    /// Unique task identifier, assigned at creation and never reused
    pub id: TaskId,
    /// The requested resource URL (immutable after creation)
    pub source_url: String,
    /// Display name derived from the URL (immutable after creation)
    pub display_name: String,
    /// Filesystem location the transfer writes to (immutable after creation)
    pub destination_path: PathBuf,
    /// Current lifecycle status
    pub status: Status,
    /// Progress percentage; None until a positive total size is known
    pub progress_percent: Option<f32>,
    /// Bytes transferred so far
    pub transferred_bytes: u64,
    /// Total size in bytes, if the server reported one
    pub total_bytes: Option<u64>,
    /// When the task was created
    pub created_at: DateTime<Utc>,
}

impl DownloadTask {
    /// Create a new task in the initial `Downloading` state with unknown progress
    pub fn new(
        id: TaskId,
        source_url: impl Into<String>,
        display_name: impl Into<String>,
        destination_path: PathBuf,
    ) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            display_name: display_name.into(),
            destination_path,
            status: Status::Downloading,
            progress_percent: None,
            transferred_bytes: 0,
            total_bytes: None,
            created_at: Utc::now(),
        }
    }

    fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            display_name: self.display_name.clone(),
            source_url: self.source_url.clone(),
            destination_path: self.destination_path.clone(),
            status: self.status,
            progress_percent: self.progress_percent,
            transferred_bytes: self.transferred_bytes,
            total_bytes: self.total_bytes,
            created_at: self.created_at,
        }
    }
}

/// Partial update applied to a registered task
///
/// Fields left as `None` are untouched. Built by the coordinator from
/// transfer progress and outcome events.
#[derive(Clone, Debug, Default)]
pub struct TaskPatch {
    /// New status, if the task is transitioning
    pub status: Option<Status>,
    /// New progress percentage
    pub progress_percent: Option<f32>,
    /// New transferred byte count
    pub transferred_bytes: Option<u64>,
    /// New total byte count
    pub total_bytes: Option<u64>,
}

/// Ordered, append-at-front collection of download tasks keyed by [`TaskId`]
///
/// Cheap to clone; all clones share the same underlying state.
#[derive(Clone)]
pub struct TaskRegistry {
    tasks: Arc<Mutex<VecDeque<DownloadTask>>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Insert a new task at the front of the ordered view (most recent first)
    ///
    /// Fails with [`Error::DuplicateTask`] if a task with the same ID is
    /// already registered.
    pub async fn insert(&self, task: DownloadTask) -> Result<()> {
        let mut tasks = self.tasks.lock().await;

        if tasks.iter().any(|t| t.id == task.id) {
            return Err(Error::DuplicateTask { id: task.id });
        }

        tasks.push_front(task);
        Ok(())
    }

    /// Apply a partial update to the task matching `id`
    ///
    /// Returns `true` if the task exists and the patch was considered,
    /// `false` if the task has been removed - the caller must treat `false`
    /// as "stop folding events for this id", not as an error.
    ///
    /// Patches against a terminal task are discarded wholesale: a late
    /// progress event must not move a completed or failed task. Progress
    /// fields are also clamped so `transferred_bytes` never decreases and
    /// `progress_percent` never exceeds 100.
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> bool {
        let mut tasks = self.tasks.lock().await;

        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };

        if task.status.is_terminal() {
            tracing::debug!(task_id = id.0, "Discarding update for terminal task");
            return true;
        }

        if let Some(status) = patch.status {
            task.status = status;
        }

        if let Some(percent) = patch.progress_percent {
            task.progress_percent = Some(percent.clamp(0.0, 100.0));
        }

        if let Some(transferred) = patch.transferred_bytes {
            task.transferred_bytes = task.transferred_bytes.max(transferred);
        }

        if let Some(total) = patch.total_bytes {
            task.total_bytes = Some(total);
        }

        true
    }

    /// Remove the task matching `id`, returning it if it was present
    ///
    /// Idempotent: removing an unknown ID returns `None` and is not an error.
    pub async fn remove(&self, id: TaskId) -> Option<DownloadTask> {
        let mut tasks = self.tasks.lock().await;
        let position = tasks.iter().position(|t| t.id == id)?;
        tasks.remove(position)
    }

    /// Point-in-time snapshot of a single task
    pub async fn get(&self, id: TaskId) -> Option<TaskSnapshot> {
        let tasks = self.tasks.lock().await;
        tasks.iter().find(|t| t.id == id).map(|t| t.snapshot())
    }

    /// Point-in-time ordered snapshot of all tasks, most recent first
    ///
    /// The returned vector is detached from registry state; presentation
    /// code cannot corrupt the registry through it.
    pub async fn snapshot(&self) -> Vec<TaskSnapshot> {
        let tasks = self.tasks.lock().await;
        tasks.iter().map(|t| t.snapshot()).collect()
    }

    /// Number of registered tasks
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Whether the registry holds no tasks
    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
