//! Browser page capability.
//!
//! The login flow, the scroller and the extractor only talk to a page through
//! [`PageContext`], so each of them runs unchanged against:
//!
//! | Implementation | Module | Backing |
//! |----------------|--------|---------|
//! | [`webdriver::WebDriverPage`] | [`webdriver`] | fantoccini over a WebDriver endpoint |
//! | [`SnapshotPage`] | [`snapshot`] | saved HTML parsed with `scraper` |
//!
//! Methods take `&self` so that two page operations can be awaited together
//! (the credential submit click and the navigation it triggers).

use std::fmt;
use std::time::Duration;

use crate::error::Result;

pub mod snapshot;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

pub use snapshot::SnapshotPage;
pub use webdriver::WebDriverLauncher;

/// DOM access for one rendered page.
pub trait PageContext {
    /// Handle to an element of this page.
    type Element: Clone + fmt::Debug;

    /// Load `url` in the page.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// URL of the currently loaded document.
    async fn current_url(&self) -> Result<String>;

    /// Wait until `selector` matches, and optionally until the match is
    /// displayed.
    ///
    /// # Errors
    ///
    /// [`crate::error::ExportError::NavigationTimeout`] once `timeout` elapses.
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
        visible: bool,
    ) -> Result<Self::Element>;

    /// First element matching `selector`, if any.
    async fn find_first(&self, selector: &str) -> Result<Option<Self::Element>>;

    /// All elements matching `selector`, in document order.
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Descendants of `parent` matching `selector`, in document order.
    async fn find_within(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>>;

    async fn read_attribute(&self, element: &Self::Element, name: &str)
        -> Result<Option<String>>;

    /// Rendered text of `element`.
    async fn read_text(&self, element: &Self::Element) -> Result<String>;

    /// Type `text` into `element`, pausing `keystroke_delay` after each
    /// character when given.
    async fn type_text(
        &self,
        element: &Self::Element,
        text: &str,
        keystroke_delay: Option<Duration>,
    ) -> Result<()>;

    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// Send the Enter key to `element`.
    async fn press_enter(&self, element: &Self::Element) -> Result<()>;

    /// Rendered text of the whole document body.
    async fn body_text(&self) -> Result<String>;

    /// Current total scrollable height of the document body.
    async fn scroll_height(&self) -> Result<f64>;

    /// Scroll the window down by `distance` pixels.
    async fn scroll_by(&self, distance: f64) -> Result<()>;

    /// Resolve once the page has moved to a new document that finished
    /// parsing.
    async fn wait_for_navigation(&self, timeout: Duration) -> Result<()>;

    /// Tear down the browsing session.
    async fn close(self) -> Result<()>;
}

/// Opens a fresh, unauthenticated page for one invocation.
pub trait SessionLauncher {
    type Page: PageContext;

    async fn launch(&self) -> Result<Self::Page>;
}
