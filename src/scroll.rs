//! Forces the lazily rendered stats table to load every row.
//!
//! Each tick reads the document height, scrolls down one step and adds the
//! step to the distance travelled. The loop ends once the distance reaches
//! the most recently observed height. Rows loaded by a scroll grow the
//! height, which is re-read on the next tick.

use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::config::ScrollSettings;
use crate::error::Result;
use crate::page::PageContext;

/// Outcome of one scroll pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSummary {
    pub ticks: u64,
    pub distance: f64,
    pub last_height: f64,
    /// False when the tick cap stopped the loop first.
    pub reached_end: bool,
}

#[derive(Debug, Clone)]
pub struct Scroller {
    settings: ScrollSettings,
}

impl Scroller {
    pub fn new(settings: ScrollSettings) -> Self {
        Self { settings }
    }

    /// Scroll until the end of the document.
    ///
    /// Only page errors are returned. Without a tick cap this waits for as
    /// long as the page keeps growing.
    #[instrument(level = "info", skip_all, fields(step = self.settings.step))]
    pub async fn scroll_to_end<P: PageContext>(&self, page: &P) -> Result<ScrollSummary> {
        let step = self.settings.step.max(1.0);
        let mut distance = 0.0;
        let mut ticks = 0u64;

        loop {
            sleep(self.settings.interval).await;
            let height = page.scroll_height().await?;
            page.scroll_by(step).await?;
            distance += step;
            ticks += 1;
            debug!(ticks, distance, height, "Scrolled");

            if distance >= height {
                info!(ticks, distance, height, "Reached the end of the page");
                return Ok(ScrollSummary {
                    ticks,
                    distance,
                    last_height: height,
                    reached_end: true,
                });
            }

            if self.settings.max_ticks.is_some_and(|max| ticks >= max) {
                warn!(ticks, distance, height, "Scroll tick cap reached before the end of the page");
                return Ok(ScrollSummary {
                    ticks,
                    distance,
                    last_height: height,
                    reached_end: false,
                });
            }
        }
    }
}
