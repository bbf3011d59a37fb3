use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::collector;
use crate::downloader::Downloader;
use crate::events::HarvestEvent;
use crate::models::{DownloadReport, ProductId};
use crate::session::{PageAdvance, ReviewPageSession};
use crate::traits::{EventSink, ReviewNavigator, SiteSelectors};

/// One complete scrape-and-download run for a single product.
pub struct Harvester {
    product_url: String,
    max_pages: u32,
    out_dir: PathBuf,
    webdriver_url: String,
    headless: bool,
    selectors: SiteSelectors,
    sink: Arc<dyn EventSink>,
}

impl Harvester {
    pub fn new(
        product_url: String,
        max_pages: u32,
        out_dir: PathBuf,
        webdriver_url: String,
        headless: bool,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            product_url,
            max_pages,
            out_dir,
            webdriver_url,
            headless,
            selectors: SiteSelectors::default(),
            sink,
        }
    }

    /// Run the whole pipeline: navigate review pages, accumulate image URLs,
    /// then download the set sequentially.
    ///
    /// Pre-flight failures (no product id in the URL, unreachable driver)
    /// abort before any work. Once a browser session exists it is closed on
    /// every exit path, including scrape errors.
    pub async fn run(&self) -> Result<DownloadReport> {
        let product_id = ProductId::from_url(&self.product_url)
            .context("no product id found in the URL (expected .../products/<digits>)")?;

        let review_dir = self.out_dir.join(format!("reviews_{product_id}"));
        tokio::fs::create_dir_all(&review_dir)
            .await
            .with_context(|| format!("could not create {}", review_dir.display()))?;

        self.sink.info(&format!("product id: {product_id}"));
        self.sink
            .info(&format!("saving into {}", review_dir.display()));

        let mut session = ReviewPageSession::connect(&self.webdriver_url, self.headless).await?;

        let scraped = self.scrape_pages(&mut session).await;
        if let Err(e) = session.quit().await {
            self.sink
                .warn(&format!("failed to close the browser session: {e}"));
        }
        let urls = scraped?;

        self.sink.info(&format!(
            "collected {} unique images, starting download",
            urls.len()
        ));

        let downloader = Downloader::new(&self.product_url)?;
        let report = downloader
            .download_all(&urls, &review_dir, &product_id, self.sink.as_ref())
            .await;

        self.sink.emit(HarvestEvent::Finished { report });
        Ok(report)
    }

    /// Walk review pages 1..=max_pages, merging each page's image URLs into
    /// one set. An exhausted navigator ends the loop early and keeps the
    /// URLs gathered so far.
    async fn scrape_pages(
        &self,
        session: &mut impl ReviewNavigator,
    ) -> Result<HashSet<String>> {
        session.open(&self.product_url).await?;
        session
            .goto_review_tab(&self.selectors, self.sink.as_ref())
            .await;

        let mut all_urls = HashSet::new();

        for page in 1..=self.max_pages {
            let advance = session
                .go_to_page(page, &self.selectors, self.sink.as_ref())
                .await;
            if advance == PageAdvance::Exhausted {
                self.sink.info(&format!(
                    "no further pages reachable after page {}",
                    session.current_page()
                ));
                break;
            }

            let source = match session.page_source().await {
                Ok(source) => source,
                Err(e) => {
                    self.sink
                        .warn(&format!("could not read page {page}: {e}"));
                    break;
                }
            };

            let page_urls =
                collector::collect_review_images(&source, &self.selectors, self.sink.as_ref());
            self.sink.emit(HarvestEvent::PageDone {
                page,
                max_pages: self.max_pages,
                images_found: page_urls.len(),
            });
            all_urls.extend(page_urls);
        }

        Ok(all_urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink;

    impl EventSink for NullSink {
        fn emit(&self, _event: HarvestEvent) {}
    }

    /// In-memory navigator serving a fixed number of single-image pages.
    struct ScriptedSession {
        pages: Vec<String>,
        current: u32,
    }

    impl ScriptedSession {
        fn with_pages(count: u32) -> Self {
            let pages = (1..=count)
                .map(|n| {
                    format!(
                        r#"<div class="YkRE5A9l4P">
                             <img class="_3wVTRzzPzH" src="https://phinf.pstatic.net/r/page{n}.jpg?type=w200">
                           </div>"#
                    )
                })
                .collect();
            Self { pages, current: 1 }
        }
    }

    impl ReviewNavigator for ScriptedSession {
        fn current_page(&self) -> u32 {
            self.current
        }

        async fn open(&self, _product_url: &str) -> Result<()> {
            Ok(())
        }

        async fn goto_review_tab(&self, _selectors: &SiteSelectors, _sink: &dyn EventSink) {}

        async fn go_to_page(
            &mut self,
            page: u32,
            _selectors: &SiteSelectors,
            _sink: &dyn EventSink,
        ) -> PageAdvance {
            if page as usize <= self.pages.len() {
                self.current = page;
                PageAdvance::Advanced
            } else {
                PageAdvance::Exhausted
            }
        }

        async fn page_source(&self) -> Result<String> {
            Ok(self.pages[self.current as usize - 1].clone())
        }
    }

    fn harvester(max_pages: u32) -> Harvester {
        Harvester::new(
            "https://brand.naver.com/x/products/77".to_string(),
            max_pages,
            PathBuf::from("unused"),
            "http://localhost:9515".to_string(),
            true,
            Arc::new(NullSink),
        )
    }

    #[tokio::test]
    async fn exhaustion_before_max_pages_keeps_earlier_urls() {
        let mut session = ScriptedSession::with_pages(3);

        let urls = harvester(10).scrape_pages(&mut session).await.unwrap();

        assert_eq!(urls.len(), 3);
        for n in 1..=3 {
            assert!(urls.contains(&format!("https://phinf.pstatic.net/r/page{n}.jpg")));
        }
        assert_eq!(session.current_page(), 3);
    }

    #[tokio::test]
    async fn max_pages_caps_the_walk() {
        let mut session = ScriptedSession::with_pages(5);

        let urls = harvester(2).scrape_pages(&mut session).await.unwrap();

        assert_eq!(urls.len(), 2);
        assert_eq!(session.current_page(), 2);
    }
}
