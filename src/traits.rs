//! Selector configuration and the event sink seam between the scraping core
//! and whatever frontend renders its progress

use anyhow::Result;

use crate::events::{HarvestEvent, Level};
use crate::session::PageAdvance;

/// CSS selectors for the storefront's review markup.
///
/// These track the storefront's current (undocumented) class names and are
/// expected to break whenever the site ships a redesign.
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Link that activates the review tab on the product page
    pub review_tab: String,
    /// Container wrapping one user review
    pub review_container: String,
    /// Image tags nested inside a review container
    pub review_image: String,
    /// Secondary flat pattern for review images outside containers
    pub flat_image: String,
    /// Pagination container under the review list
    pub pagination_container: String,
    /// Generic "next page" control within the pagination area
    pub pagination_next: String,
    /// Host the review image CDN serves from; anything else is dropped
    pub image_host: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            review_tab: "a[href*='#REVIEW']".to_string(),
            review_container: "div.YkRE5A9l4P".to_string(),
            review_image: "img._3wVTRzzPzH, img._2SqzkWDFme".to_string(),
            flat_image: "div._25CKxIKjAk img".to_string(),
            pagination_container: "div._2LCk94m75R".to_string(),
            pagination_next: "a.UWN4IvaQza".to_string(),
            image_host: "phinf.pstatic.net".to_string(),
        }
    }
}

/// Paginated access to a product's review section.
///
/// `ReviewPageSession` implements this over a live WebDriver; the page loop
/// depends only on this surface, so a scripted session can drive it in tests.
pub(crate) trait ReviewNavigator {
    async fn open(&self, product_url: &str) -> Result<()>;
    async fn goto_review_tab(&self, selectors: &SiteSelectors, sink: &dyn EventSink);
    async fn go_to_page(
        &mut self,
        page: u32,
        selectors: &SiteSelectors,
        sink: &dyn EventSink,
    ) -> PageAdvance;
    async fn page_source(&self) -> Result<String>;
    fn current_page(&self) -> u32;
}

/// Sink for structured events emitted by the scraping core.
///
/// The core never writes to a log widget or terminal directly; it emits
/// `(level, message)` events here and the frontend decides how to render them.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);

    fn info(&self, message: &str) {
        self.emit(HarvestEvent::Log {
            level: Level::Info,
            message: message.to_string(),
        });
    }

    fn warn(&self, message: &str) {
        self.emit(HarvestEvent::Log {
            level: Level::Warn,
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.emit(HarvestEvent::Log {
            level: Level::Error,
            message: message.to_string(),
        });
    }
}
