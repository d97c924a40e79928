//! Invocation configuration.
//!
//! Values arrive through [`crate::cli::ExportArgs`] (flags or environment) and
//! are validated once per invocation into an [`ExportConfig`], which the
//! exporter receives at construction. Nothing below reads the environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::ExportArgs;
use crate::error::{ExportError, Result};

/// Sign-in entry point; redirects back to the home page after login.
pub const SIGNIN_URL: &str =
    "https://medium.com/m/signin?redirect=https%3A%2F%2Fmedium.com%2F&operation=login";

/// Stats page exported when none is configured.
pub const DEFAULT_STATS_URL: &str = "https://medium.com/google-cloud-jp/stats/stories";

/// Object key prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "test/";

/// Default WebDriver endpoint (chromedriver / selenium).
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Login credentials. `Debug` never prints the secrets.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub recovery_email: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &crate::utils::mask_identity(&self.username))
            .field("password", &"<redacted>")
            .field("recovery_email", &"<redacted>")
            .finish()
    }
}

/// Waits and delays used while driving the login flow.
#[derive(Debug, Clone)]
pub struct LoginTimings {
    /// Upper bound for an expected element to appear.
    pub element_timeout: Duration,
    /// Upper bound for the post-submit navigation.
    pub navigation_timeout: Duration,
    /// Upper bound for the home-page marker probe.
    pub home_probe_timeout: Duration,
    /// Interval between text probes.
    pub probe_interval: Duration,
    /// Delay between typed password characters.
    pub keystroke_delay: Duration,
    /// Pause after submitting credentials and after the recovery step.
    pub settle_delay: Duration,
}

impl Default for LoginTimings {
    fn default() -> Self {
        Self {
            element_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(30),
            home_probe_timeout: Duration::from_secs(30),
            probe_interval: Duration::from_millis(250),
            keystroke_delay: Duration::from_millis(100),
            settle_delay: Duration::from_secs(3),
        }
    }
}

/// Scroll loop parameters.
#[derive(Debug, Clone)]
pub struct ScrollSettings {
    /// Pixels scrolled per tick.
    pub step: f64,
    /// Pause between ticks.
    pub interval: Duration,
    /// Stop after this many ticks even if the page keeps growing.
    /// `None` keeps scrolling until the end is reached.
    pub max_ticks: Option<u64>,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            step: 100.0,
            interval: Duration::from_millis(300),
            max_ticks: None,
        }
    }
}

/// Where the serialized document goes.
#[derive(Clone)]
pub enum Destination {
    /// Cloud Storage bucket. Without a token the metadata server is asked.
    Gcs {
        bucket: String,
        access_token: Option<String>,
    },
    /// Local directory, keyed the same way as the bucket.
    Local(PathBuf),
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Gcs { bucket, access_token } => f
                .debug_struct("Gcs")
                .field("bucket", bucket)
                .field("access_token", &access_token.as_ref().map(|_| "<redacted>"))
                .finish(),
            Destination::Local(path) => f.debug_tuple("Local").field(path).finish(),
        }
    }
}

/// Validated configuration for one export invocation.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub credentials: Credentials,
    pub destination: Destination,
    pub webdriver_url: String,
    pub headless: bool,
    pub signin_url: String,
    pub stats_url: String,
    pub key_prefix: String,
    pub login: LoginTimings,
    pub scroll: ScrollSettings,
}

fn required(value: &Option<String>, name: &'static str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ExportError::MissingConfig(name)),
    }
}

impl ExportConfig {
    /// Validate parsed arguments.
    ///
    /// # Errors
    ///
    /// [`ExportError::MissingConfig`] naming the first absent or blank value.
    /// The bucket is only required when no local directory is given.
    pub fn from_args(args: &ExportArgs) -> Result<Self> {
        let credentials = Credentials {
            username: required(&args.username, "MEDIUM_USERNAME")?,
            password: required(&args.password, "MEDIUM_PASSWORD")?,
            recovery_email: required(&args.recovery_email, "RECOVERY_EMAIL")?,
        };

        let destination = match &args.local_dir {
            Some(dir) => Destination::Local(dir.clone()),
            None => Destination::Gcs {
                bucket: required(&args.bucket, "MEDIUM_BUCKET")?,
                access_token: args.access_token.clone().filter(|t| !t.trim().is_empty()),
            },
        };

        Ok(Self {
            credentials,
            destination,
            webdriver_url: args.webdriver_url.clone(),
            headless: !args.headed,
            signin_url: SIGNIN_URL.to_string(),
            stats_url: args.stats_url.clone(),
            key_prefix: args.key_prefix.clone(),
            login: LoginTimings::default(),
            scroll: ScrollSettings {
                max_ticks: args.max_scroll_ticks,
                ..ScrollSettings::default()
            },
        })
    }
}
