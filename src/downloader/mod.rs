//! Core downloader implementation split into focused submodules.
//!
//! The `HttpDownloader` struct and its methods are organized by domain:
//! - [`tasks`] - Starting downloads and driving transfer events
//! - [`control`] - Task deletion and file cleanup
//! - [`lifecycle`] - Shutdown coordination

mod control;
mod lifecycle;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::registry::TaskRegistry;
use crate::transfer::{HttpTransferClient, TransferClient};
use crate::types::{Event, TaskId, TaskSnapshot};

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
///
/// Owns the task registry, the event channel, and the set of in-flight
/// transfers. All commands go through this type; consumers observe state via
/// [`snapshot`](HttpDownloader::snapshot) and
/// [`subscribe`](HttpDownloader::subscribe).
#[derive(Clone)]
pub struct HttpDownloader {
    /// Authoritative task collection
    pub(crate) registry: TaskRegistry,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: std::sync::Arc<Config>,
    /// Transfer client (trait object for pluggable implementations)
    pub(crate) transfer: std::sync::Arc<dyn TransferClient>,
    /// Map of active downloads to their cancellation tokens
    pub(crate) active_transfers: std::sync::Arc<
        tokio::sync::Mutex<
            std::collections::HashMap<TaskId, tokio_util::sync::CancellationToken>,
        >,
    >,
    /// Monotonic task ID source; never reused within a downloader instance
    pub(crate) next_task_id: std::sync::Arc<std::sync::atomic::AtomicU64>,
    /// Flag to indicate whether new downloads are accepted (set to false during shutdown)
    pub(crate) accepting_new: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl HttpDownloader {
    /// Create a new HttpDownloader instance
    ///
    /// Validates the configuration, ensures the download directory exists,
    /// and sets up the HTTP transfer client and the event broadcast channel.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let transfer = HttpTransferClient::new(&config.user_agent)?;
        Self::with_transfer_client(config, std::sync::Arc::new(transfer)).await
    }

    /// Create a downloader with a custom [`TransferClient`]
    ///
    /// Useful for embedding alternative transports and for tests that script
    /// transfer progress without a network.
    pub async fn with_transfer_client(
        config: Config,
        transfer: std::sync::Arc<dyn TransferClient>,
    ) -> Result<Self> {
        config.validate()?;

        // Ensure the download directory exists before any transfer targets it
        tokio::fs::create_dir_all(&config.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download_dir.display(),
                        e
                    ),
                ))
            })?;

        // Multiple subscribers receive all events independently
        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_channel_capacity);

        Ok(Self {
            registry: TaskRegistry::new(),
            event_tx,
            config: std::sync::Arc::new(config),
            transfer,
            active_transfers: std::sync::Arc::new(tokio::sync::Mutex::new(
                std::collections::HashMap::new(),
            )),
            next_task_id: std::sync::Arc::new(std::sync::atomic::AtomicU64::new(1)),
            accepting_new: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true)),
        })
    }

    /// Subscribe to lifecycle events
    ///
    /// Each subscriber gets an independent receiver. A subscriber that falls
    /// behind the channel capacity observes `RecvError::Lagged` and skips
    /// ahead; the downloader itself never blocks on slow subscribers.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Ordered snapshot of all tasks, most recent first
    pub async fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.registry.snapshot().await
    }

    /// Look up a single task by ID
    pub async fn task(&self, id: TaskId) -> Result<TaskSnapshot> {
        self.registry.get(id).await.ok_or(Error::NotFound { id })
    }

    /// Number of transfers currently in flight
    pub async fn active_transfer_count(&self) -> usize {
        self.active_transfers.lock().await.len()
    }

    /// The configuration this downloader was created with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Broadcast an event, ignoring the no-subscribers case
    pub(crate) fn emit_event(&self, event: Event) {
        // send() errors only when there are no receivers; events are
        // fire-and-forget so that is not a failure.
        self.event_tx.send(event).ok();
    }
}
