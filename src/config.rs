//! Configuration types for http-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for [`HttpDownloader`](crate::HttpDownloader)
///
/// All fields have sensible defaults; `Config::default()` works out of the
/// box and downloads into `./downloads`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Download directory (default: "./downloads")
    ///
    /// Created on startup if it does not exist. Derived filenames are joined
    /// onto this directory; two tasks that derive the same filename write to
    /// the same path and the later transfer wins.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// User-Agent header sent with every transfer (default: "http-dl/<version>")
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Event broadcast channel capacity (default: 1000)
    ///
    /// A subscriber that falls behind by more than this many events receives
    /// a `RecvError::Lagged` and skips ahead.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            user_agent: default_user_agent(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// Returns `Error::Config` naming the offending key if a value is unusable.
    pub fn validate(&self) -> Result<()> {
        if self.download_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "download_dir must not be empty".to_string(),
                key: Some("download_dir".to_string()),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config {
                message: "user_agent must not be empty".to_string(),
                key: Some("user_agent".to_string()),
            });
        }

        // tokio's broadcast channel panics on a zero capacity
        if self.event_channel_capacity == 0 {
            return Err(Error::Config {
                message: "event_channel_capacity must be positive".to_string(),
                key: Some("event_channel_capacity".to_string()),
            });
        }

        Ok(())
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_user_agent() -> String {
    concat!("http-dl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}
