//! # Medium Stats Export
//!
//! Signs in to the Medium stats dashboard with a headless browser, scrolls
//! the per-story stats table until every row has rendered, extracts the rows
//! into a pipe-delimited document and stores it in Cloud Storage under
//! `<prefix>stats-medium-metrics-<YYYY-MM-DD>.csv`.
//!
//! ## Usage
//!
//! ```sh
//! MEDIUM_USERNAME=… MEDIUM_PASSWORD=… RECOVERY_EMAIL=… MEDIUM_BUCKET=… \
//!   medium_stats_export export
//! ```
//!
//! ## Architecture
//!
//! 1. **Login**: [`auth`] drives the sign-in state machine, including the
//!    optional identity verification prompt
//! 2. **Scrolling**: [`scroll`] forces the lazily rendered table to load
//! 3. **Extraction**: [`extract`] turns each table row into a record
//! 4. **Output**: [`outputs::csv`] renders the document, [`storage`] stores it
//!
//! [`exporter`] sequences the steps and owns the browser session.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod auth;
mod cli;
mod config;
mod error;
mod exporter;
mod extract;
mod import;
mod models;
mod outputs;
mod page;
mod scroll;
mod storage;
mod utils;

use cli::{Cli, Command};
use extract::DocumentExtractor;
use import::ArticleMetrics;
use page::SnapshotPage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.command, "Parsed CLI arguments");

    match args.command {
        Command::Export(export_args) => {
            let response = exporter::invoke(&export_args).await;
            println!("{}", response.body);
            info!(status = response.status, elapsed = ?start_time.elapsed(), "Execution complete");
            if !response.is_success() {
                return Err(format!("export failed with status {}", response.status).into());
            }
        }
        Command::Extract { html, base_url } => {
            let page = SnapshotPage::from_file(&html, base_url).await?;
            let document = DocumentExtractor.extract(&page).await?;
            print!("{}", outputs::csv::serialize(&document));
            info!(rows = document.len(), "Extraction complete");
        }
        Command::Inspect { file } => {
            let text = tokio::fs::read_to_string(&file).await?;
            let metrics: Vec<ArticleMetrics> = import::parse_document(&text)
                .iter()
                .map(ArticleMetrics::from_record)
                .collect();
            if let Some(date) = import::snapshot_date(&file.to_string_lossy()) {
                info!(%date, current = import::is_current(&file.to_string_lossy(), utils::utc_today()), "Snapshot date");
            }
            print!("{}", outputs::json::to_json_lines(&metrics)?);
        }
    }

    Ok(())
}
