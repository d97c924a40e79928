//! [`PageContext`] backed by a WebDriver session.
//!
//! Sessions are opened against a running chromedriver (or Selenium) endpoint
//! with `fantoccini`. Chrome is started headless with `--no-sandbox` so the
//! exporter can run inside a container.

use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use super::{PageContext, SessionLauncher};
use crate::error::{ExportError, Result};

/// WebDriver code point for the Enter key.
const ENTER_KEY: &str = "\u{E007}";

/// Poll interval for visibility and navigation checks.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Opens Chrome sessions on a WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    webdriver_url: String,
    headless: bool,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: impl Into<String>, headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            headless,
        }
    }

    fn capabilities(&self) -> serde_json::Map<String, Value> {
        let mut args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
        if self.headless {
            args.push("--headless=new");
        }
        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps
    }
}

impl SessionLauncher for WebDriverLauncher {
    type Page = WebDriverPage;

    #[instrument(level = "info", skip_all, fields(webdriver_url = %self.webdriver_url, headless = self.headless))]
    async fn launch(&self) -> Result<WebDriverPage> {
        let client = ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| ExportError::Browser(format!("cannot open WebDriver session: {e}")))?;
        info!("Browser session opened");
        Ok(WebDriverPage { client })
    }
}

/// One browser tab driven over WebDriver.
pub struct WebDriverPage {
    client: Client,
}

impl WebDriverPage {
    async fn script(&self, source: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.client.execute(source, args).await?)
    }
}

fn timeout_error(selector: &str, waited: Duration) -> ExportError {
    ExportError::NavigationTimeout {
        selector: selector.to_string(),
        waited,
    }
}

impl PageContext for WebDriverPage {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(%url, "Navigating");
        self.client.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration, visible: bool) -> Result<Element> {
        let started = Instant::now();
        let element = match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(element) => element,
            Err(CmdError::WaitTimeout) => return Err(timeout_error(selector, timeout)),
            Err(e) => return Err(e.into()),
        };

        if visible {
            while !element.is_displayed().await? {
                if started.elapsed() >= timeout {
                    return Err(timeout_error(selector, timeout));
                }
                sleep(POLL_INTERVAL).await;
            }
        }
        Ok(element)
    }

    async fn find_first(&self, selector: &str) -> Result<Option<Element>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        Ok(self.client.find_all(Locator::Css(selector)).await?)
    }

    async fn find_within(&self, parent: &Element, selector: &str) -> Result<Vec<Element>> {
        Ok(parent.find_all(Locator::Css(selector)).await?)
    }

    async fn read_attribute(&self, element: &Element, name: &str) -> Result<Option<String>> {
        Ok(element.attr(name).await?)
    }

    async fn read_text(&self, element: &Element) -> Result<String> {
        Ok(element.text().await?)
    }

    async fn type_text(
        &self,
        element: &Element,
        text: &str,
        keystroke_delay: Option<Duration>,
    ) -> Result<()> {
        match keystroke_delay {
            Some(delay) => {
                let mut buf = [0u8; 4];
                for ch in text.chars() {
                    element.send_keys(ch.encode_utf8(&mut buf)).await?;
                    sleep(delay).await;
                }
            }
            None => element.send_keys(text).await?,
        }
        Ok(())
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element.click().await?;
        Ok(())
    }

    async fn press_enter(&self, element: &Element) -> Result<()> {
        element.send_keys(ENTER_KEY).await?;
        Ok(())
    }

    async fn body_text(&self) -> Result<String> {
        let value = self
            .script("return document.body ? document.body.innerText : '';", vec![])
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn scroll_height(&self) -> Result<f64> {
        let value = self
            .script("return document.body ? document.body.scrollHeight : 0;", vec![])
            .await?;
        value
            .as_f64()
            .ok_or_else(|| ExportError::Browser(format!("unexpected scrollHeight value: {value}")))
    }

    async fn scroll_by(&self, distance: f64) -> Result<()> {
        self.script("window.scrollBy(0, arguments[0]);", vec![json!(distance)])
            .await?;
        Ok(())
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        let origin = self.current_url().await?;
        loop {
            sleep(POLL_INTERVAL).await;
            if self.current_url().await? != origin {
                let state = self.script("return document.readyState;", vec![]).await?;
                if state.as_str() != Some("loading") {
                    debug!(from = %origin, "Navigation finished");
                    return Ok(());
                }
            }
            if started.elapsed() >= timeout {
                return Err(timeout_error("navigation", timeout));
            }
        }
    }

    async fn close(self) -> Result<()> {
        self.client.close().await?;
        info!("Browser session closed");
        Ok(())
    }
}
