//! Utility functions

use chrono::{DateTime, Utc};

/// Derive a display filename from a URL's path
///
/// Returns the final path segment of the URL, or `None` if the URL does not
/// parse or the path ends in a slash (no usable segment). Callers fall back
/// to [`fallback_display_name`] in that case.
///
/// The segment is used verbatim - no percent-decoding - so the on-disk name
/// matches what the address bar showed.
///
/// # Examples
///
/// ```
/// use http_dl::utils::filename_from_url;
///
/// assert_eq!(
///     filename_from_url("https://host/path/file.zip").as_deref(),
///     Some("file.zip")
/// );
/// assert_eq!(filename_from_url("not a url"), None);
/// ```
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;

    if last_segment.is_empty() {
        return None;
    }

    Some(last_segment.to_string())
}

/// Synthesize a display name for URLs with no usable path segment
///
/// Produces `download_<millis>` from the given creation time, matching the
/// naming scheme used for unparseable URLs.
pub fn fallback_display_name(created_at: DateTime<Utc>) -> String {
    format!("download_{}", created_at.timestamp_millis())
}

/// Format a byte count for display
///
/// Base-1024 units (B/KB/MB/GB) with two-decimal rounding:
/// `round(value / 1024^i * 100) / 100`. Zero or unknown sizes render as
/// `"0 B"`. Presentation helper only - the core never formats bytes itself.
///
/// # Examples
///
/// ```
/// use http_dl::utils::format_bytes;
///
/// assert_eq!(format_bytes(Some(1536)), "1.5 KB");
/// assert_eq!(format_bytes(None), "0 B");
/// ```
pub fn format_bytes(bytes: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let Some(bytes) = bytes.filter(|b| *b > 0) else {
        return "0 B".to_string();
    };

    let exponent = (((bytes as f64).ln() / 1024_f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;

    format!("{} {}", rounded, UNITS[exponent])
}
