//! Task deletion and on-disk cleanup.

use crate::error::Result;
use crate::types::{Event, Status, TaskId};

use super::HttpDownloader;

impl HttpDownloader {
    /// Delete a task, cancelling its transfer if still in flight
    ///
    /// Idempotent: deleting an unknown or already-deleted ID succeeds
    /// without effect. The downloaded file is removed from disk only when
    /// the task had completed; an in-flight transfer cleans up its own
    /// partial file on cancellation, and a failed task has nothing usable
    /// to remove.
    ///
    /// File removal is best-effort: an unlink error is logged and the
    /// deletion still succeeds.
    pub async fn delete_task(&self, id: TaskId) -> Result<()> {
        // Cancel first so the transfer stops producing events for this id
        if let Some(token) = self.active_transfers.lock().await.remove(&id) {
            tracing::info!(task_id = id.0, "Cancelling in-flight transfer");
            token.cancel();
        }

        let Some(task) = self.registry.remove(id).await else {
            tracing::debug!(task_id = id.0, "Delete for unknown task, ignoring");
            return Ok(());
        };

        if task.status == Status::Completed {
            if let Err(e) = tokio::fs::remove_file(&task.destination_path).await {
                tracing::warn!(
                    task_id = id.0,
                    path = %task.destination_path.display(),
                    error = %e,
                    "Failed to remove downloaded file"
                );
            }
        }

        tracing::info!(task_id = id.0, name = %task.display_name, "Task deleted");
        self.emit_event(Event::Removed { id });

        Ok(())
    }
}
