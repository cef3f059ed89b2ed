//! Startup and shutdown coordination.

use std::sync::atomic::Ordering;

use crate::error::Result;
use crate::types::Event;

use super::HttpDownloader;

impl HttpDownloader {
    /// Gracefully shut down the downloader
    ///
    /// Stops accepting new downloads, cancels every in-flight transfer, and
    /// emits [`Event::Shutdown`]. Tasks whose transfers are cancelled settle
    /// as failed through the normal event path. Registry state remains
    /// readable after shutdown.
    ///
    /// Idempotent: repeated calls are no-ops beyond the first.
    pub async fn shutdown(&self) -> Result<()> {
        if self.accepting_new.swap(false, Ordering::SeqCst) {
            tracing::info!("Shutting down downloader");
        }

        let tokens: Vec<_> = {
            let mut active = self.active_transfers.lock().await;
            active.drain().collect()
        };

        for (id, token) in tokens {
            tracing::debug!(task_id = id.0, "Cancelling transfer for shutdown");
            token.cancel();
        }

        self.emit_event(Event::Shutdown);
        Ok(())
    }

    /// Whether the downloader still accepts new downloads
    pub fn is_accepting_new(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }
}
