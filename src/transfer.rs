//! Transfer client - the single-resource streaming fetch the coordinator consumes.
//!
//! The [`TransferClient`] trait is the seam between the download coordinator
//! and the network: one `begin_transfer` call yields a [`TransferHandle`]
//! that emits an ordered, finite stream of progress events and resolves
//! exactly once to a [`TransferOutcome`]. The production implementation is
//! [`HttpTransferClient`] (reqwest, streaming body writes); tests script the
//! same contract without a network.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Buffered progress events per in-flight transfer.
/// The coordinator drains continuously; the bound only matters when it lags.
const PROGRESS_CHANNEL_CAPACITY: usize = 32;

/// A single progress observation for an in-flight transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes written to the destination so far (monotonically non-decreasing)
    pub bytes_transferred: u64,
    /// Total size in bytes, if the server reported a content length
    pub total_bytes: Option<u64>,
}

/// The terminal result of a transfer, delivered exactly once
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The HTTP exchange completed and the body was written to disk
    ///
    /// Carries the response status code verbatim; classifying non-2xx
    /// responses as failures is the caller's concern.
    Success {
        /// HTTP response status code
        status: u16,
    },
    /// The transfer did not complete (transport error, filesystem error,
    /// or cancellation)
    Failed {
        /// Human-readable error description
        error: String,
    },
}

/// Live handle to one in-flight transfer
///
/// Progress events for a handle are delivered in order; the outcome settles
/// after the last progress event. Once [`cancel`](TransferHandle::cancel) is
/// called no further progress is delivered and the outcome settles as
/// `Failed` (or is dropped if the handle is gone).
pub struct TransferHandle {
    progress: mpsc::Receiver<TransferProgress>,
    outcome: oneshot::Receiver<TransferOutcome>,
    cancel: CancellationToken,
}

impl TransferHandle {
    /// Assemble a handle from its channel halves
    ///
    /// Used by [`TransferClient`] implementations; the sending halves stay
    /// with the transfer task.
    pub fn new(
        progress: mpsc::Receiver<TransferProgress>,
        outcome: oneshot::Receiver<TransferOutcome>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            progress,
            outcome,
            cancel,
        }
    }

    /// Request cancellation of the underlying transfer
    ///
    /// Best-effort: accepted immediately, the actual halt happens
    /// asynchronously inside the transfer task.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the cancellation token, for cancelling after the handle
    /// itself has been consumed by the event-driving loop
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receive the next progress event
    ///
    /// Returns `None` once the transfer task has stopped emitting progress
    /// (the outcome is then ready or imminent).
    pub async fn next_progress(&mut self) -> Option<TransferProgress> {
        self.progress.recv().await
    }

    /// Await the terminal outcome
    ///
    /// Resolves at most once. Returns `None` if the transfer task dropped
    /// the outcome channel without settling - callers treat that like a
    /// cancelled transfer and discard.
    pub async fn outcome(self) -> Option<TransferOutcome> {
        self.outcome.await.ok()
    }
}

/// A client capable of fetching one remote resource to a local file
///
/// The coordinator holds this as a trait object so tests can substitute a
/// scripted implementation.
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Start fetching `url` into `destination`
    ///
    /// Never blocks for the duration of the transfer; all errors after
    /// dispatch surface through the handle's outcome.
    async fn begin_transfer(&self, url: &str, destination: &Path) -> TransferHandle;
}

/// Production [`TransferClient`] backed by reqwest
///
/// Streams the response body to the destination file chunk by chunk,
/// emitting a progress event per chunk. Cancellation aborts the stream and
/// removes the partial file (best-effort).
#[derive(Clone)]
pub struct HttpTransferClient {
    client: reqwest::Client,
}

impl HttpTransferClient {
    /// Create a client with the given User-Agent header
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TransferClient for HttpTransferClient {
    async fn begin_transfer(&self, url: &str, destination: &Path) -> TransferHandle {
        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let client = self.client.clone();
        let url = url.to_string();
        let destination = destination.to_path_buf();
        let token = cancel.clone();

        tokio::spawn(async move {
            let outcome = run_transfer(client, url, destination, progress_tx, token).await;
            // The receiver may be gone if the task was deleted; the outcome
            // is then silently dropped per the discard rule.
            outcome_tx.send(outcome).ok();
        });

        TransferHandle::new(progress_rx, outcome_rx, cancel)
    }
}

/// Drive one GET request to completion, cancellation, or error
async fn run_transfer(
    client: reqwest::Client,
    url: String,
    destination: PathBuf,
    progress: mpsc::Sender<TransferProgress>,
    cancel: CancellationToken,
) -> TransferOutcome {
    let response = tokio::select! {
        _ = cancel.cancelled() => {
            return TransferOutcome::Failed {
                error: "transfer cancelled".to_string(),
            };
        }
        response = client.get(&url).send() => match response {
            Ok(response) => response,
            Err(e) => {
                return TransferOutcome::Failed {
                    error: format!("request failed: {e}"),
                };
            }
        },
    };

    let status = response.status().as_u16();
    let total_bytes = response.content_length();

    let mut file = match tokio::fs::File::create(&destination).await {
        Ok(file) => file,
        Err(e) => {
            return TransferOutcome::Failed {
                error: format!("failed to create {}: {e}", destination.display()),
            };
        }
    };

    let mut stream = response.bytes_stream();
    let mut bytes_transferred: u64 = 0;

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => {
                drop(file);
                remove_partial(&destination).await;
                return TransferOutcome::Failed {
                    error: "transfer cancelled".to_string(),
                };
            }
            chunk = stream.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                if let Err(e) = file.write_all(&bytes).await {
                    drop(file);
                    remove_partial(&destination).await;
                    return TransferOutcome::Failed {
                        error: format!("failed to write {}: {e}", destination.display()),
                    };
                }

                bytes_transferred += bytes.len() as u64;

                // send() only fails when the handle is gone; keep streaming,
                // the transfer itself is still wanted until cancelled.
                let _ = progress
                    .send(TransferProgress {
                        bytes_transferred,
                        total_bytes,
                    })
                    .await;
            }
            Some(Err(e)) => {
                drop(file);
                remove_partial(&destination).await;
                return TransferOutcome::Failed {
                    error: format!("transfer stream error: {e}"),
                };
            }
            None => break,
        }
    }

    if let Err(e) = file.flush().await {
        return TransferOutcome::Failed {
            error: format!("failed to flush {}: {e}", destination.display()),
        };
    }

    TransferOutcome::Success { status }
}

/// Remove a partially written destination file, best-effort
async fn remove_partial(destination: &Path) {
    if let Err(e) = tokio::fs::remove_file(destination).await {
        tracing::debug!(
            path = %destination.display(),
            error = %e,
            "Failed to remove partial download file"
        );
    }
}
