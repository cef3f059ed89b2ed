//! Core types for http-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a download task
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<TaskId> for u64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl PartialEq<u64> for TaskId {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl PartialEq<TaskId> for u64 {
    fn eq(&self, other: &TaskId) -> bool {
        *self == other.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Download task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Currently downloading
    Downloading,
    /// Paused by user
    ///
    /// Reserved for a future pause/resume command set. No operation in the
    /// current release produces this state, but consumers should handle it.
    Paused,
    /// Successfully completed
    Completed,
    /// Failed with error
    Failed,
}

impl Status {
    /// Whether this status is terminal (no further transitions occur)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }
}

/// Event emitted during the download lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task created and transfer dispatched
    Queued {
        /// Task ID
        id: TaskId,
        /// Display name derived from the URL
        name: String,
    },

    /// Task removed from the registry
    Removed {
        /// Task ID
        id: TaskId,
    },

    /// Transfer progress update
    Progress {
        /// Task ID
        id: TaskId,
        /// Progress percentage (0.0 to 100.0); None until the total size is known
        #[serde(skip_serializing_if = "Option::is_none")]
        percent: Option<f32>,
        /// Bytes transferred so far
        transferred_bytes: u64,
        /// Total size in bytes, if the server reported one
        #[serde(skip_serializing_if = "Option::is_none")]
        total_bytes: Option<u64>,
    },

    /// Transfer finished successfully
    Completed {
        /// Task ID
        id: TaskId,
        /// Display name (for success notifications)
        name: String,
        /// Final path of the downloaded file
        path: PathBuf,
    },

    /// Transfer failed
    Failed {
        /// Task ID
        id: TaskId,
        /// Display name (for failure notifications)
        name: String,
        /// Error message
        error: String,
    },

    /// Graceful shutdown initiated
    Shutdown,
}

/// Point-in-time view of a download task
///
/// Returned by [`snapshot()`](crate::HttpDownloader::snapshot) for
/// presentation. Detached from registry state; mutating a snapshot has no
/// effect on the task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Unique task identifier
    pub id: TaskId,

    /// Display name (filename derived from the URL)
    pub display_name: String,

    /// The requested resource URL
    pub source_url: String,

    /// Filesystem location the transfer writes to
    pub destination_path: PathBuf,

    /// Current status
    pub status: Status,

    /// Progress percentage (0.0 to 100.0); None until the total size is known
    pub progress_percent: Option<f32>,

    /// Bytes transferred so far
    pub transferred_bytes: u64,

    /// Total size in bytes, if the server reported one
    pub total_bytes: Option<u64>,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}
