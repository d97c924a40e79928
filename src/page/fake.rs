//! Scripted [`PageContext`] for tests.
//!
//! Elements are identified by the selector that found them. A selector
//! resolves when it was registered with [`FakePage::with_element`]; body text
//! and scroll heights are replayed from queues, repeating the last value.

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use super::{PageContext, SessionLauncher};
use crate::error::{ExportError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(String),
    Typed {
        selector: String,
        text: String,
        delayed: bool,
    },
    Clicked(String),
    Enter(String),
    ScrolledBy(f64),
    NavigationAwaited,
}

#[derive(Default)]
pub struct FakePage {
    present: HashSet<String>,
    failing_clicks: HashSet<String>,
    body_texts: RefCell<VecDeque<String>>,
    heights: RefCell<VecDeque<f64>>,
    last_height: Cell<f64>,
    pub actions: Rc<RefCell<Vec<Action>>>,
    pub closed: Rc<Cell<bool>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, selector: &str) -> Self {
        self.present.insert(selector.to_string());
        self
    }

    pub fn with_failing_click(mut self, selector: &str) -> Self {
        self.failing_clicks.insert(selector.to_string());
        self
    }

    pub fn with_body_texts(self, texts: &[&str]) -> Self {
        self.body_texts
            .borrow_mut()
            .extend(texts.iter().map(|t| t.to_string()));
        self
    }

    pub fn with_heights(self, heights: &[f64]) -> Self {
        self.heights.borrow_mut().extend(heights.iter().copied());
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.borrow().clone()
    }

    fn record(&self, action: Action) {
        self.actions.borrow_mut().push(action);
    }
}

impl PageContext for FakePage {
    type Element = String;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(Action::Navigate(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .actions
            .borrow()
            .iter()
            .rev()
            .find_map(|a| match a {
                Action::Navigate(url) => Some(url.clone()),
                _ => None,
            });
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn wait_for(&self, selector: &str, timeout: Duration, _visible: bool) -> Result<String> {
        self.find_first(selector)
            .await?
            .ok_or_else(|| ExportError::NavigationTimeout {
                selector: selector.to_string(),
                waited: timeout,
            })
    }

    async fn find_first(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.present.get(selector).cloned())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<String>> {
        Ok(self.find_first(selector).await?.into_iter().collect())
    }

    async fn find_within(&self, _parent: &String, _selector: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn read_attribute(&self, _element: &String, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn read_text(&self, _element: &String) -> Result<String> {
        Ok(String::new())
    }

    async fn type_text(
        &self,
        element: &String,
        text: &str,
        keystroke_delay: Option<Duration>,
    ) -> Result<()> {
        self.record(Action::Typed {
            selector: element.clone(),
            text: text.to_string(),
            delayed: keystroke_delay.is_some(),
        });
        Ok(())
    }

    async fn click(&self, element: &String) -> Result<()> {
        if self.failing_clicks.contains(element) {
            return Err(ExportError::Browser(format!("element {element} not interactable")));
        }
        self.record(Action::Clicked(element.clone()));
        Ok(())
    }

    async fn press_enter(&self, element: &String) -> Result<()> {
        self.record(Action::Enter(element.clone()));
        Ok(())
    }

    async fn body_text(&self) -> Result<String> {
        let mut texts = self.body_texts.borrow_mut();
        let text = if texts.len() > 1 {
            texts.pop_front()
        } else {
            texts.front().cloned()
        };
        Ok(text.unwrap_or_default())
    }

    async fn scroll_height(&self) -> Result<f64> {
        let mut heights = self.heights.borrow_mut();
        if let Some(h) = heights.pop_front() {
            self.last_height.set(h);
        }
        Ok(self.last_height.get())
    }

    async fn scroll_by(&self, distance: f64) -> Result<()> {
        self.record(Action::ScrolledBy(distance));
        Ok(())
    }

    async fn wait_for_navigation(&self, _timeout: Duration) -> Result<()> {
        self.record(Action::NavigationAwaited);
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.closed.set(true);
        Ok(())
    }
}

/// Hands out one prepared [`FakePage`].
pub struct FakeLauncher {
    page: RefCell<Option<FakePage>>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page: RefCell::new(Some(page)),
        }
    }
}

impl SessionLauncher for FakeLauncher {
    type Page = FakePage;

    async fn launch(&self) -> Result<FakePage> {
        self.page
            .borrow_mut()
            .take()
            .ok_or_else(|| ExportError::Browser("fake page already launched".into()))
    }
}
