//! JSON lines rendering of imported metrics.
//!
//! One compact JSON object per story, newline-terminated, so the output of
//! `inspect` can be piped into line-oriented tools.

use tracing::{info, instrument};

use crate::import::ArticleMetrics;

/// Render metrics as JSON lines.
#[instrument(level = "info", skip_all, fields(count = metrics.len()))]
pub fn to_json_lines(metrics: &[ArticleMetrics]) -> serde_json::Result<String> {
    let mut out = String::new();
    for item in metrics {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    info!(bytes = out.len(), "Rendered JSON lines");
    Ok(out)
}
