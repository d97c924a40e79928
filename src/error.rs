//! Error taxonomy for a single export invocation.
//!
//! Every stage returns [`Result`]. Only the recovery-prompt branch of the
//! login flow swallows its error ([`ExportError::RecoveryFlow`]); everything
//! else aborts the invocation.

use std::time::Duration;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Configuration ─────────────────────────────────────────────────────────
    #[error("Missing configuration value: {0}")]
    MissingConfig(&'static str),

    // ── Browser / navigation ──────────────────────────────────────────────────
    #[error("Timed out after {waited:?} waiting for `{selector}`")]
    NavigationTimeout { selector: String, waited: Duration },

    #[error("Browser error: {0}")]
    Browser(String),

    // ── Extraction ────────────────────────────────────────────────────────────
    #[error("Row {row}: {reason}")]
    Extraction { row: usize, reason: String },

    #[error("Recovery prompt handling failed: {0}")]
    RecoveryFlow(String),

    // ── Storage ───────────────────────────────────────────────────────────────
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Shorthand for a row-level extraction failure.
    pub fn extraction(row: usize, reason: impl Into<String>) -> Self {
        ExportError::Extraction {
            row,
            reason: reason.into(),
        }
    }

    /// True for the variants that end an invocation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ExportError::RecoveryFlow(_))
    }
}

impl From<fantoccini::error::CmdError> for ExportError {
    fn from(e: fantoccini::error::CmdError) -> Self {
        ExportError::Browser(e.to_string())
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(e: reqwest::Error) -> Self {
        ExportError::Upload(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
