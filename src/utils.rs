//! Small helpers shared across the pipeline.
//!
//! - Epoch-millisecond timestamps to `YYYY-MM-DD` (UTC)
//! - String truncation and masking for logging
//! - File system validation for the local output sink

use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::error::Result;

/// Format an epoch-millisecond timestamp as a UTC calendar date.
///
/// Returns `None` when the timestamp is outside chrono's representable range.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(date_from_millis(1_700_000_000_000).as_deref(), Some("2023-11-14"));
/// ```
pub fn date_from_millis(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Parse a platform timestamp string (integer milliseconds) into a date.
///
/// Surrounding whitespace is ignored. Anything that is not an integer yields
/// `None`.
pub fn date_from_millis_str(raw: &str) -> Option<String> {
    raw.trim().parse::<i64>().ok().and_then(date_from_millis)
}

/// Today's date in UTC.
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and byte count appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Mask an account identifier, keeping its first two characters and domain.
///
/// `"someone@example.com"` becomes `"so***@example.com"`.
pub fn mask_identity(identity: &str) -> String {
    let (local, domain) = match identity.split_once('@') {
        Some((l, d)) => (l, Some(d)),
        None => (identity, None),
    };
    let head: String = local.chars().take(2).collect();
    match domain {
        Some(d) => format!("{head}***@{d}"),
        None => format!("{head}***"),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    fs::File::create(&probe_path).await?;
    if let Err(e) = fs::remove_file(&probe_path).await {
        warn!(path = %probe_path.display(), error = %e, "Failed to remove write probe");
    }
    info!("Output directory is writable");
    Ok(())
}
