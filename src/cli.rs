//! Command-line interface definitions.
//!
//! Every setting of the `export` command can be provided as a flag or through
//! the environment variable named next to it.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DEFAULT_KEY_PREFIX, DEFAULT_STATS_URL, DEFAULT_WEBDRIVER_URL};

/// Command-line arguments for the stats exporter.
///
/// # Examples
///
/// ```sh
/// # Export to the configured bucket (credentials from the environment)
/// medium_stats_export export
///
/// # Write the object to a local directory instead
/// medium_stats_export export --local-dir ./out
///
/// # Extract from a saved stats page without a browser
/// medium_stats_export extract ./stats.html
///
/// # Read back an exported document
/// medium_stats_export inspect ./out/test/stats-medium-metrics-2024-03-05.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in, scrape the stats page and upload the document
    Export(ExportArgs),
    /// Extract a document from a saved stats page and print it
    Extract {
        /// Saved HTML of a stats page
        html: PathBuf,
        /// URL the page was saved from, used to resolve relative links
        #[arg(long, default_value = DEFAULT_STATS_URL)]
        base_url: String,
    },
    /// Parse an exported document and print one JSON object per story
    Inspect {
        /// Exported document
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Account used to sign in
    #[arg(long, env = "MEDIUM_USERNAME")]
    pub username: Option<String>,

    /// Account password
    #[arg(long, env = "MEDIUM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Email typed into the identity verification prompt
    #[arg(long, env = "RECOVERY_EMAIL", hide_env_values = true)]
    pub recovery_email: Option<String>,

    /// Destination Cloud Storage bucket
    #[arg(long, env = "MEDIUM_BUCKET")]
    pub bucket: Option<String>,

    /// OAuth access token for Cloud Storage (metadata server when absent)
    #[arg(long, env = "GCS_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Write the document under this directory instead of the bucket
    #[arg(long, env = "LOCAL_OUTPUT_DIR")]
    pub local_dir: Option<PathBuf>,

    /// WebDriver endpoint
    #[arg(long, env = "WEBDRIVER_URL", default_value = DEFAULT_WEBDRIVER_URL)]
    pub webdriver_url: String,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Stats page to export
    #[arg(long, env = "MEDIUM_STATS_URL", default_value = DEFAULT_STATS_URL)]
    pub stats_url: String,

    /// Prefix for the object key
    #[arg(long, env = "KEY_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    pub key_prefix: String,

    /// Give up scrolling after this many ticks (unbounded when absent)
    #[arg(long, env = "MAX_SCROLL_TICKS")]
    pub max_scroll_ticks: Option<u64>,
}
