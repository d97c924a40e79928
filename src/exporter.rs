//! One export invocation, from login to upload.
//!
//! ```text
//! launch → authenticate → open stats page → scroll → extract → serialize → upload → close
//! ```
//!
//! Steps run strictly one after another. The first failure skips the
//! remaining steps; the browser session is closed in every case. The
//! outcome is reported as a [`Response`] with an HTTP-style status.

use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::auth::SessionAuthenticator;
use crate::cli::ExportArgs;
use crate::config::ExportConfig;
use crate::error::Result;
use crate::extract::DocumentExtractor;
use crate::outputs::csv;
use crate::page::{PageContext, SessionLauncher, WebDriverLauncher};
use crate::scroll::Scroller;
use crate::storage::{object_key, Sink, Uploader};
use crate::utils::utc_today;

/// Plain-text status returned to the trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn success() -> Self {
        Self {
            status: 200,
            body: "Success".to_string(),
        }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            status: 500,
            body: format!("An error occurred: {error}"),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// What a successful invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub key: String,
    pub rows: usize,
    pub bytes: usize,
}

/// Owns the configuration and collaborators of one invocation.
pub struct Exporter<L, U> {
    config: ExportConfig,
    launcher: L,
    uploader: U,
}

impl<L: SessionLauncher, U: Uploader> Exporter<L, U> {
    pub fn new(config: ExportConfig, launcher: L, uploader: U) -> Self {
        Self {
            config,
            launcher,
            uploader,
        }
    }

    /// Run the pipeline and map the outcome to a [`Response`].
    pub async fn handle(&self) -> Response {
        let t0 = Instant::now();
        match self.run().await {
            Ok(report) => {
                info!(
                    key = %report.key,
                    rows = report.rows,
                    bytes = report.bytes,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Successfully uploaded stats"
                );
                Response::success()
            }
            Err(e) => {
                error!(
                    error = %e,
                    fatal = e.is_fatal(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Export failed"
                );
                Response::failure(e)
            }
        }
    }

    /// Run the pipeline.
    #[instrument(level = "info", skip_all, fields(stats_url = %self.config.stats_url))]
    pub async fn run(&self) -> Result<ExportReport> {
        let page = self.launcher.launch().await?;
        let outcome = self.export_with(&page).await;
        info!("Closing browser");
        if let Err(e) = page.close().await {
            warn!(error = %e, "Failed to close browser session");
        }
        outcome
    }

    async fn export_with(&self, page: &L::Page) -> Result<ExportReport> {
        let config = &self.config;

        SessionAuthenticator::new(&config.credentials, &config.signin_url, &config.login)
            .authenticate(page)
            .await?;

        info!(url = %config.stats_url, "Opening the stats page");
        page.navigate(&config.stats_url).await?;

        Scroller::new(config.scroll.clone()).scroll_to_end(page).await?;

        let document = DocumentExtractor.extract(page).await?;
        let text = csv::serialize(&document);

        let key = object_key(&config.key_prefix, utc_today());
        info!(%key, rows = document.len(), bytes = text.len(), "Uploading document");
        let bytes = text.len();
        self.uploader.upload(&key, text).await?;
        info!("Export done");

        Ok(ExportReport {
            key,
            rows: document.len(),
            bytes,
        })
    }
}

/// Validate configuration and run one export against a real browser.
///
/// Configuration errors are reported like any other failure.
pub async fn invoke(args: &ExportArgs) -> Response {
    let config = match ExportConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Response::failure(e);
        }
    };
    info!(destination = ?config.destination, headless = config.headless, "Configuration loaded");

    let launcher = WebDriverLauncher::new(config.webdriver_url.clone(), config.headless);
    let sink = Sink::from_destination(&config.destination);
    Exporter::new(config, launcher, sink).handle().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IDENTIFIER_INPUT, IDENTIFIER_NEXT, IDP_LOGIN_BUTTON, PASSWORD_INPUT, PASSWORD_NEXT};
    use crate::config::{Credentials, Destination, LoginTimings, ScrollSettings};
    use crate::error::ExportError;
    use crate::extract::ROW_SELECTOR;
    use crate::page::fake::{Action, FakeLauncher, FakePage};
    use std::cell::RefCell;
    use std::time::Duration;

    /// Keeps uploads in memory; optionally fails.
    #[derive(Default)]
    struct MemoryUploader {
        objects: RefCell<Vec<(String, String)>>,
        fail: bool,
    }

    impl Uploader for MemoryUploader {
        async fn upload(&self, key: &str, body: String) -> Result<()> {
            if self.fail {
                return Err(ExportError::Upload("403 Forbidden".into()));
            }
            self.objects.borrow_mut().push((key.to_string(), body));
            Ok(())
        }
    }

    fn config() -> ExportConfig {
        ExportConfig {
            credentials: Credentials {
                username: "writer@example.com".into(),
                password: "pw".into(),
                recovery_email: "backup@example.com".into(),
            },
            destination: Destination::Local("/unused".into()),
            webdriver_url: "http://localhost:4444".into(),
            headless: true,
            signin_url: "https://medium.com/m/signin".into(),
            stats_url: "https://medium.com/acme/stats/stories".into(),
            key_prefix: "test/".into(),
            login: LoginTimings {
                element_timeout: Duration::from_millis(5),
                navigation_timeout: Duration::from_millis(5),
                home_probe_timeout: Duration::from_millis(5),
                probe_interval: Duration::from_millis(1),
                keystroke_delay: Duration::ZERO,
                settle_delay: Duration::ZERO,
            },
            scroll: ScrollSettings {
                step: 100.0,
                interval: Duration::from_millis(1),
                max_ticks: None,
            },
        }
    }

    fn logged_in_page() -> FakePage {
        FakePage::new()
            .with_element(IDP_LOGIN_BUTTON)
            .with_element(IDENTIFIER_INPUT)
            .with_element(IDENTIFIER_NEXT)
            .with_element(PASSWORD_INPUT)
            .with_element(PASSWORD_NEXT)
            .with_body_texts(&["HOME"])
            .with_heights(&[300.0])
    }

    #[tokio::test]
    async fn test_zero_rows_uploads_header_only_document() {
        let page = logged_in_page();
        let (actions, closed) = (page.actions.clone(), page.closed.clone());
        let exporter = Exporter::new(config(), FakeLauncher::new(page), MemoryUploader::default());

        let response = exporter.handle().await;
        assert_eq!(response, Response::success());

        let objects = exporter.uploader.objects.borrow();
        assert_eq!(objects.len(), 1);
        let (key, body) = &objects[0];
        assert_eq!(key, &object_key("test/", utc_today()));
        assert_eq!(body, &csv::header());
        assert!(closed.get());
        assert!(actions
            .borrow()
            .contains(&Action::Navigate("https://medium.com/acme/stats/stories".into())));
    }

    #[tokio::test]
    async fn test_login_failure_skips_upload_and_closes_browser() {
        let page = FakePage::new().with_element(IDP_LOGIN_BUTTON);
        let closed = page.closed.clone();
        let exporter = Exporter::new(config(), FakeLauncher::new(page), MemoryUploader::default());

        let response = exporter.handle().await;
        assert_eq!(response.status, 500);
        assert!(response.body.contains("#identifierId"));
        assert!(exporter.uploader.objects.borrow().is_empty());
        assert!(closed.get());
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported() {
        let page = logged_in_page();
        let closed = page.closed.clone();
        let uploader = MemoryUploader {
            fail: true,
            ..Default::default()
        };
        let exporter = Exporter::new(config(), FakeLauncher::new(page), uploader);

        let err = exporter.run().await.unwrap_err();
        assert!(matches!(err, ExportError::Upload(_)));
        assert!(closed.get());
    }

    #[tokio::test]
    async fn test_broken_row_skips_upload_and_closes_browser() {
        let page = logged_in_page().with_element(ROW_SELECTOR);
        let closed = page.closed.clone();
        let exporter = Exporter::new(config(), FakeLauncher::new(page), MemoryUploader::default());

        let err = exporter.run().await.unwrap_err();
        assert!(matches!(err, ExportError::Extraction { row: 0, .. }));
        assert!(exporter.uploader.objects.borrow().is_empty());
        assert!(closed.get());
    }

    #[tokio::test]
    async fn test_broken_row_is_a_failed_invocation() {
        let page = logged_in_page().with_element(ROW_SELECTOR);
        let exporter = Exporter::new(config(), FakeLauncher::new(page), MemoryUploader::default());

        let response = exporter.handle().await;
        assert_eq!(response.status, 500);
        assert!(response.body.starts_with("An error occurred:"));
        assert!(exporter.uploader.objects.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_launch_failure_is_reported() {
        let launcher = FakeLauncher::new(logged_in_page());
        let exporter = Exporter::new(config(), launcher, MemoryUploader::default());
        assert!(exporter.handle().await.is_success());
        // The fake launcher hands out its page once.
        let second = exporter.handle().await;
        assert_eq!(second.status, 500);
    }

    #[tokio::test]
    async fn test_invalid_configuration_is_a_failed_invocation() {
        use crate::cli::{Cli, Command};
        use clap::Parser;

        let cli = Cli::parse_from(["medium_stats_export", "export", "--username", "", "--bucket", "b"]);
        let Command::Export(args) = cli.command else {
            panic!("expected export command");
        };
        let response = invoke(&args).await;
        assert_eq!(response.status, 500);
        assert!(response.body.contains("MEDIUM_USERNAME"));
    }
}
