//! Shared test helpers for creating HttpDownloader instances in tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::tempdir;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::downloader::HttpDownloader;
use crate::transfer::{TransferClient, TransferHandle, TransferOutcome, TransferProgress};
use crate::types::Event;

/// One transfer dispatched to a [`ManualTransferClient`], with its sending
/// halves exposed so a test can script progress and settle the outcome.
pub(crate) struct BegunTransfer {
    pub(crate) url: String,
    pub(crate) destination: PathBuf,
    pub(crate) progress: mpsc::Sender<TransferProgress>,
    pub(crate) outcome: Option<oneshot::Sender<TransferOutcome>>,
    pub(crate) cancel: CancellationToken,
}

impl BegunTransfer {
    /// Send one progress observation to the coordinator
    pub(crate) async fn send_progress(&self, bytes_transferred: u64, total_bytes: Option<u64>) {
        self.progress
            .send(TransferProgress {
                bytes_transferred,
                total_bytes,
            })
            .await
            .unwrap();
    }

    /// Settle the transfer; dropping the progress sender ends the stream
    pub(crate) fn settle(mut self, outcome: TransferOutcome) {
        let tx = self.outcome.take().unwrap();
        drop(self.progress);
        // The coordinator may have discarded the handle already
        tx.send(outcome).ok();
    }
}

/// Scripted [`TransferClient`] that records dispatched transfers instead of
/// touching the network. Tests pop transfers off the queue and drive them.
#[derive(Clone, Default)]
pub(crate) struct ManualTransferClient {
    begun: Arc<Mutex<VecDeque<BegunTransfer>>>,
}

impl ManualTransferClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for the next dispatched transfer (the coordinator spawns them
    /// asynchronously, so poll briefly instead of failing immediately)
    pub(crate) async fn next_transfer(&self) -> BegunTransfer {
        for _ in 0..100 {
            if let Some(transfer) = self.begun.lock().await.pop_front() {
                return transfer;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no transfer was dispatched within 1s");
    }

    pub(crate) async fn dispatched_count(&self) -> usize {
        self.begun.lock().await.len()
    }
}

#[async_trait]
impl TransferClient for ManualTransferClient {
    async fn begin_transfer(&self, url: &str, destination: &Path) -> TransferHandle {
        let (progress_tx, progress_rx) = mpsc::channel(32);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        self.begun.lock().await.push_back(BegunTransfer {
            url: url.to_string(),
            destination: destination.to_path_buf(),
            progress: progress_tx,
            outcome: Some(outcome_tx),
            cancel: cancel.clone(),
        });

        TransferHandle::new(progress_rx, outcome_rx, cancel)
    }
}

/// Helper to create a test HttpDownloader with a scripted transfer client.
/// Returns the downloader, the client, and the tempdir (which must be kept
/// alive).
pub(crate) async fn create_test_downloader(
) -> (HttpDownloader, ManualTransferClient, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let config = Config {
        download_dir: temp_dir.path().join("downloads"),
        ..Default::default()
    };

    let client = ManualTransferClient::new();
    let downloader = HttpDownloader::with_transfer_client(config, Arc::new(client.clone()))
        .await
        .unwrap();

    (downloader, client, temp_dir)
}

/// Receive the next event, failing the test if none arrives in time
pub(crate) async fn recv_event(rx: &mut broadcast::Receiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Assert that no event arrives within a short window
pub(crate) async fn assert_no_event(rx: &mut broadcast::Receiver<Event>) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    match rx.try_recv() {
        Err(broadcast::error::TryRecvError::Empty) => {}
        other => panic!("expected no event, got {other:?}"),
    }
}
