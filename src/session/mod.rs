//! Live browser session and review pagination

use std::time::Duration;

use anyhow::{Context, Result};
use thirtyfour::prelude::*;

use crate::traits::{EventSink, ReviewNavigator, SiteSelectors};

/// Upper bound on waiting for an element to appear after a page load
const PAGE_LOAD_WAIT: Duration = Duration::from_secs(10);
/// Poll interval while waiting for an element
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Fixed pause after clicking a control so the page can reload
const SETTLE_DELAY: Duration = Duration::from_secs(2);
/// Pause after the initial product page load
const INITIAL_LOAD_DELAY: Duration = Duration::from_secs(3);

/// Outcome of asking the navigator to advance one page.
///
/// `Exhausted` is a normal termination condition, not an error: the caller
/// stops the pagination loop and keeps everything collected so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAdvance {
    Advanced,
    Exhausted,
}

/// Wraps the WebDriver handle for one product's review section.
///
/// Created once per run; the harvester guarantees `quit` is called on every
/// exit path so the browser process is never leaked.
pub struct ReviewPageSession {
    driver: WebDriver,
    current_page: u32,
}

impl ReviewPageSession {
    /// Connect to the WebDriver endpoint and start a browser.
    ///
    /// Failure here means no session was created; the run aborts without
    /// side effects beyond the (idempotent) destination directory.
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if headless {
            caps.set_headless()?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg("--window-size=1920,1080")?;

        let driver = WebDriver::new(webdriver_url, caps)
            .await
            .context("could not reach the WebDriver endpoint")?;

        Ok(Self {
            driver,
            current_page: 1,
        })
    }

    async fn click_next_control(
        &mut self,
        page: u32,
        selectors: &SiteSelectors,
        sink: &dyn EventSink,
    ) -> PageAdvance {
        let next = match self.driver.find(By::Css(&selectors.pagination_next)).await {
            Ok(el) => el,
            Err(_) => {
                sink.warn(&format!("no control found to reach page {page}"));
                return PageAdvance::Exhausted;
            }
        };

        let class = next.attr("class").await.ok().flatten().unwrap_or_default();
        if class.contains("disabled") {
            sink.warn(&format!("next control is disabled, cannot reach page {page}"));
            return PageAdvance::Exhausted;
        }

        if next.click().await.is_err() {
            sink.warn(&format!("failed to click the next control for page {page}"));
            return PageAdvance::Exhausted;
        }

        tokio::time::sleep(SETTLE_DELAY).await;
        self.current_page = page;
        PageAdvance::Advanced
    }

    /// Shut the browser down. Consumes the session so nothing can touch the
    /// driver afterwards.
    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await?;
        Ok(())
    }
}

impl ReviewNavigator for ReviewPageSession {
    fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Load the product page and give it time to render.
    async fn open(&self, product_url: &str) -> Result<()> {
        self.driver.goto(product_url).await?;
        tokio::time::sleep(INITIAL_LOAD_DELAY).await;
        Ok(())
    }

    /// Click through to the review tab. The tab may already be active (the
    /// URL usually carries a `#REVIEW` fragment), in which case the control
    /// is missing or inert and that is fine.
    async fn goto_review_tab(&self, selectors: &SiteSelectors, sink: &dyn EventSink) {
        let clicked = match self
            .driver
            .query(By::Css(&selectors.review_tab))
            .wait(PAGE_LOAD_WAIT, POLL_INTERVAL)
            .first()
            .await
        {
            Ok(tab) => tab.click().await.is_ok(),
            Err(_) => false,
        };

        if clicked {
            tokio::time::sleep(SETTLE_DELAY).await;
            sink.info("moved to the review tab");
        } else {
            sink.info("review tab control not found, assuming it is already active");
        }
    }

    /// Advance to the requested review page.
    ///
    /// Page 1 is already showing after the initial load, so it is a no-op.
    /// For later pages, prefer a pagination link whose visible label equals
    /// the page number; fall back to the generic "next" control when no such
    /// link exists. Missing or disabled controls terminate pagination with
    /// `Exhausted` rather than an error, as do transient lookup failures.
    async fn go_to_page(
        &mut self,
        page: u32,
        selectors: &SiteSelectors,
        sink: &dyn EventSink,
    ) -> PageAdvance {
        if page == 1 {
            return PageAdvance::Advanced;
        }

        let pagination = match self
            .driver
            .find(By::Css(&selectors.pagination_container))
            .await
        {
            Ok(el) => el,
            Err(_) => {
                sink.warn(&format!(
                    "pagination controls not found, stopping at page {}",
                    self.current_page
                ));
                return PageAdvance::Exhausted;
            }
        };

        let links = match pagination.find_all(By::Tag("a")).await {
            Ok(links) => links,
            Err(e) => {
                sink.warn(&format!("could not list pagination links: {e}"));
                return PageAdvance::Exhausted;
            }
        };

        let wanted = page.to_string();
        for link in &links {
            let label = match link.text().await {
                Ok(text) => text,
                Err(_) => continue,
            };
            if label.trim() == wanted && link.click().await.is_ok() {
                tokio::time::sleep(SETTLE_DELAY).await;
                self.current_page = page;
                return PageAdvance::Advanced;
            }
        }

        self.click_next_control(page, selectors, sink).await
    }

    /// Serialized DOM of the currently loaded page, for the collector.
    async fn page_source(&self) -> Result<String> {
        Ok(self.driver.source().await?)
    }
}
