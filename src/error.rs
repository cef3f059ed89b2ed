//! Error types for http-dl
//!
//! Every failure in this library is localized: a transfer error marks one
//! task as failed, a cleanup error is logged and swallowed. Nothing here is
//! fatal to the embedding process.

use crate::types::TaskId;
use thiserror::Error;

/// Result type alias for http-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for http-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// Rejected command input (e.g., an empty or whitespace-only URL)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A task with this ID is already registered
    ///
    /// Should not occur under the monotonic ID generation policy; surfaced
    /// so a registry misuse fails loudly instead of silently replacing a task.
    #[error("task {id} already exists")]
    DuplicateTask {
        /// The task ID that was already present
        id: TaskId,
    },

    /// Task not found in the registry
    ///
    /// Only returned by explicit lookups. Progress or outcome events for a
    /// removed task are discarded silently, never reported through this.
    #[error("task {id} not found")]
    NotFound {
        /// The task ID that was not found
        id: TaskId,
    },

    /// Network error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_display_includes_reason() {
        let err = Error::InvalidInput("URL must not be empty".into());
        assert_eq!(err.to_string(), "invalid input: URL must not be empty");
    }

    #[test]
    fn duplicate_task_display_includes_id() {
        let err = Error::DuplicateTask { id: TaskId::new(7) };
        assert_eq!(err.to_string(), "task 7 already exists");
    }

    #[test]
    fn not_found_display_includes_id() {
        let err = Error::NotFound { id: TaskId::new(42) };
        assert_eq!(err.to_string(), "task 42 not found");
    }

    #[test]
    fn config_display_includes_message() {
        let err = Error::Config {
            message: "event_channel_capacity must be positive".into(),
            key: Some("event_channel_capacity".into()),
        };
        assert_eq!(
            err.to_string(),
            "configuration error: event_channel_capacity must be positive"
        );
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn shutting_down_display() {
        assert_eq!(
            Error::ShuttingDown.to_string(),
            "shutdown in progress: not accepting new downloads"
        );
    }
}
