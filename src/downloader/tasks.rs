//! Starting downloads and folding transfer events into the registry.

use std::sync::atomic::Ordering;

use crate::error::{Error, Result};
use crate::registry::{DownloadTask, TaskPatch};
use crate::transfer::{TransferHandle, TransferOutcome};
use crate::types::{Event, Status, TaskId};
use crate::utils;

use super::HttpDownloader;

impl HttpDownloader {
    /// Start downloading `url` into the configured download directory
    ///
    /// Validates the URL is non-blank, derives a display name from its final
    /// path segment (falling back to `download_<millis>` when the URL has no
    /// usable segment), registers the task, dispatches the transfer, and
    /// returns the new task's ID immediately. Progress and the final result
    /// arrive through the event channel and the registry.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the URL is empty or whitespace-only
    /// - [`Error::ShuttingDown`] if [`shutdown`](HttpDownloader::shutdown)
    ///   has been called
    pub async fn start_download(&self, url: &str) -> Result<TaskId> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidInput("URL must not be empty".to_string()));
        }

        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let id = TaskId::new(self.next_task_id.fetch_add(1, Ordering::SeqCst));

        let task = {
            let display_name = match utils::filename_from_url(url) {
                Some(name) => name,
                None => utils::fallback_display_name(chrono::Utc::now()),
            };
            let destination_path = self.config.download_dir.join(&display_name);
            DownloadTask::new(id, url, display_name, destination_path)
        };

        let display_name = task.display_name.clone();
        let destination_path = task.destination_path.clone();

        tracing::info!(
            task_id = id.0,
            url = %url,
            name = %display_name,
            "Starting download"
        );

        self.registry.insert(task).await?;

        let handle = self.transfer.begin_transfer(url, &destination_path).await;

        // Register the cancellation token before any event can race a delete
        self.active_transfers
            .lock()
            .await
            .insert(id, handle.cancel_token());

        self.emit_event(Event::Queued {
            id,
            name: display_name.clone(),
        });

        let downloader = self.clone();
        tokio::spawn(async move {
            downloader.drive_transfer(id, display_name, handle).await;
        });

        Ok(id)
    }

    /// Fold one transfer's progress and outcome into the registry and events
    ///
    /// Runs until the transfer settles. If the registry reports the task as
    /// removed, remaining events for it are discarded without emitting.
    pub(crate) async fn drive_transfer(
        &self,
        id: TaskId,
        display_name: String,
        mut handle: TransferHandle,
    ) {
        let mut removed = false;

        while let Some(progress) = handle.next_progress().await {
            if removed {
                continue;
            }

            let percent = progress.total_bytes.filter(|t| *t > 0).map(|total| {
                (progress.bytes_transferred as f32 / total as f32) * 100.0
            });

            let applied = self
                .registry
                .update(
                    id,
                    TaskPatch {
                        progress_percent: percent,
                        transferred_bytes: Some(progress.bytes_transferred),
                        total_bytes: progress.total_bytes,
                        ..Default::default()
                    },
                )
                .await;

            if !applied {
                // Task was deleted mid-transfer; drain silently
                removed = true;
                continue;
            }

            self.emit_event(Event::Progress {
                id,
                percent,
                transferred_bytes: progress.bytes_transferred,
                total_bytes: progress.total_bytes,
            });
        }

        let outcome = handle.outcome().await;
        self.active_transfers.lock().await.remove(&id);

        if removed {
            return;
        }

        match outcome {
            Some(TransferOutcome::Success { status }) if (200..300).contains(&status) => {
                self.finish_task(
                    id,
                    Status::Completed,
                    TaskPatch {
                        status: Some(Status::Completed),
                        progress_percent: Some(100.0),
                        ..Default::default()
                    },
                    |path| Event::Completed {
                        id,
                        name: display_name.clone(),
                        path,
                    },
                )
                .await;
            }
            Some(TransferOutcome::Success { status }) => {
                let error = format!("server returned status {status}");
                tracing::warn!(task_id = id.0, status, "Download failed");
                self.finish_task(
                    id,
                    Status::Failed,
                    TaskPatch {
                        status: Some(Status::Failed),
                        ..Default::default()
                    },
                    |_| Event::Failed {
                        id,
                        name: display_name.clone(),
                        error: error.clone(),
                    },
                )
                .await;
            }
            Some(TransferOutcome::Failed { error }) => {
                tracing::warn!(task_id = id.0, error = %error, "Download failed");
                self.finish_task(
                    id,
                    Status::Failed,
                    TaskPatch {
                        status: Some(Status::Failed),
                        ..Default::default()
                    },
                    |_| Event::Failed {
                        id,
                        name: display_name.clone(),
                        error: error.clone(),
                    },
                )
                .await;
            }
            // Outcome channel dropped without settling: treat like a removed
            // task and discard.
            None => {}
        }
    }

    /// Apply a terminal patch and emit the matching event, unless the task
    /// was removed in the meantime
    async fn finish_task(
        &self,
        id: TaskId,
        status: Status,
        patch: TaskPatch,
        event: impl FnOnce(std::path::PathBuf) -> Event,
    ) {
        if !self.registry.update(id, patch).await {
            return;
        }

        let Some(snapshot) = self.registry.get(id).await else {
            return;
        };

        if status == Status::Completed {
            tracing::info!(
                task_id = id.0,
                path = %snapshot.destination_path.display(),
                "Download completed"
            );
        }

        self.emit_event(event(snapshot.destination_path));
    }
}
