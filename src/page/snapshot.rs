//! [`PageContext`] over a saved HTML document.
//!
//! Used to run the extractor against a stats page saved from a browser, and
//! by the extractor tests. The document is static: typing and clicking are
//! rejected, scrolling does nothing.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::PageContext;
use crate::error::{ExportError, Result};

/// A parsed HTML document posing as a loaded page.
pub struct SnapshotPage {
    html: Html,
    url: String,
}

impl SnapshotPage {
    /// Parse `html` as if it had been loaded from `url`.
    pub fn parse(html: &str, url: impl Into<String>) -> Self {
        Self {
            html: Html::parse_document(html),
            url: url.into(),
        }
    }

    /// Read and parse a saved page.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn from_file(path: &Path, url: impl Into<String>) -> Result<Self> {
        let html = tokio::fs::read_to_string(path).await?;
        info!(bytes = html.len(), "Loaded saved page");
        Ok(Self::parse(&html, url))
    }

    fn element(&self, handle: NodeId) -> Result<ElementRef<'_>> {
        self.html
            .tree
            .get(handle)
            .and_then(ElementRef::wrap)
            .ok_or_else(|| ExportError::Browser(format!("stale element handle {handle:?}")))
    }

    fn read_only(action: &str) -> ExportError {
        ExportError::Browser(format!("cannot {action} on a saved page"))
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ExportError::Browser(format!("invalid selector `{selector}`: {e}")))
}

/// Approximates `innerText`: text nodes joined, whitespace collapsed.
fn rendered_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

impl PageContext for SnapshotPage {
    type Element = NodeId;

    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(%url, loaded = %self.url, "Ignoring navigation on saved page");
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration, _visible: bool) -> Result<NodeId> {
        self.find_first(selector)
            .await?
            .ok_or_else(|| ExportError::NavigationTimeout {
                selector: selector.to_string(),
                waited: timeout,
            })
    }

    async fn find_first(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).map(|e| e.id()).collect())
    }

    async fn find_within(&self, parent: &NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = parse_selector(selector)?;
        let parent = self.element(*parent)?;
        Ok(parent.select(&selector).map(|e| e.id()).collect())
    }

    async fn read_attribute(&self, element: &NodeId, name: &str) -> Result<Option<String>> {
        Ok(self.element(*element)?.value().attr(name).map(str::to_string))
    }

    async fn read_text(&self, element: &NodeId) -> Result<String> {
        Ok(rendered_text(self.element(*element)?))
    }

    async fn type_text(&self, _: &NodeId, _: &str, _: Option<Duration>) -> Result<()> {
        Err(Self::read_only("type"))
    }

    async fn click(&self, _: &NodeId) -> Result<()> {
        Err(Self::read_only("click"))
    }

    async fn press_enter(&self, _: &NodeId) -> Result<()> {
        Err(Self::read_only("press keys"))
    }

    async fn body_text(&self) -> Result<String> {
        match self.find_first("body").await? {
            Some(body) => self.read_text(&body).await,
            None => Ok(String::new()),
        }
    }

    async fn scroll_height(&self) -> Result<f64> {
        Ok(0.0)
    }

    async fn scroll_by(&self, _distance: f64) -> Result<()> {
        Ok(())
    }

    async fn wait_for_navigation(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1>Stats</h1>
          <ul>
            <li class="item" data-id="1"><a href="/a">First
              link</a></li>
            <li class="item" data-id="2"><a href="/b">Second</a><a href="/c">Third</a></li>
          </ul>
        </body></html>"#;

    #[tokio::test]
    async fn test_find_all_in_document_order() {
        let page = SnapshotPage::parse(PAGE, "https://medium.com/me/stats");
        let items = page.find_all("li.item").await.unwrap();
        assert_eq!(items.len(), 2);
        let ids = [
            page.read_attribute(&items[0], "data-id").await.unwrap(),
            page.read_attribute(&items[1], "data-id").await.unwrap(),
        ];
        assert_eq!(ids, [Some("1".to_string()), Some("2".to_string())]);
    }

    #[tokio::test]
    async fn test_find_within_scopes_to_parent() {
        let page = SnapshotPage::parse(PAGE, "https://medium.com/me/stats");
        let items = page.find_all("li.item").await.unwrap();
        let links = page.find_within(&items[1], "a").await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(page.read_text(&links[1]).await.unwrap(), "Third");
        assert_eq!(
            page.read_attribute(&links[0], "href").await.unwrap().as_deref(),
            Some("/b")
        );
    }

    #[tokio::test]
    async fn test_read_text_collapses_whitespace() {
        let page = SnapshotPage::parse(PAGE, "https://medium.com/me/stats");
        let first = page.find_first("li.item a").await.unwrap().unwrap();
        assert_eq!(page.read_text(&first).await.unwrap(), "First link");
    }

    #[tokio::test]
    async fn test_wait_for_missing_element_times_out() {
        let page = SnapshotPage::parse(PAGE, "https://medium.com/me/stats");
        let err = page
            .wait_for("#identifierId", Duration::from_secs(1), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::NavigationTimeout { .. }));
    }

    #[tokio::test]
    async fn test_interaction_is_rejected() {
        let page = SnapshotPage::parse(PAGE, "https://medium.com/me/stats");
        let h1 = page.find_first("h1").await.unwrap().unwrap();
        assert!(page.click(&h1).await.is_err());
        assert!(page.body_text().await.unwrap().starts_with("Stats"));
    }

    #[tokio::test]
    async fn test_invalid_selector() {
        let page = SnapshotPage::parse(PAGE, "https://medium.com/me/stats");
        assert!(page.find_all("li[").await.is_err());
    }
}
