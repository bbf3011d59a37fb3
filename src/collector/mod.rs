//! Review image collection and thumbnail URL resolution

use std::collections::HashSet;

use scraper::{Html, Selector};

use crate::traits::{EventSink, SiteSelectors};

/// Strip the CDN's size-controlling query suffix from a thumbnail URL,
/// recovering the original-resolution address.
///
/// Thumbnail: `https://phinf.pstatic.net/.../20240101_123_1.jpg?type=w200`
/// Original:  `https://phinf.pstatic.net/.../20240101_123_1.jpg`
///
/// Pure string transform; no validation that the result is reachable.
pub fn resolve_original_url(url: &str) -> &str {
    if let Some((prefix, _)) = url.split_once("?type=") {
        prefix
    } else if let Some((prefix, _)) = url.split_once('?') {
        prefix
    } else {
        url
    }
}

/// Scan a loaded review page for image URLs.
///
/// Matches image tags nested in review containers plus the secondary flat
/// pattern, keeps only addresses on the expected CDN host, and resolves each
/// to its original form before inserting so that two thumbnails of the same
/// asset with different size suffixes dedup to one entry. Zero matches is an
/// empty set, not an error; an unparsable selector is reported to the sink
/// and skipped, keeping whatever the other patterns collected.
pub fn collect_review_images(
    html: &str,
    selectors: &SiteSelectors,
    sink: &dyn EventSink,
) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut urls = HashSet::new();

    match (
        Selector::parse(&selectors.review_container),
        Selector::parse(&selectors.review_image),
    ) {
        (Ok(container_sel), Ok(image_sel)) => {
            let reviews: Vec<_> = document.select(&container_sel).collect();
            sink.info(&format!("found {} reviews on this page", reviews.len()));

            for review in reviews {
                for img in review.select(&image_sel) {
                    if let Some(src) = img.value().attr("src")
                        && src.contains(&selectors.image_host)
                    {
                        urls.insert(resolve_original_url(src).to_string());
                    }
                }
            }
        }
        _ => sink.warn("review container selectors failed to parse, skipping container scan"),
    }

    // Some review layouts expose images outside the usual containers.
    match Selector::parse(&selectors.flat_image) {
        Ok(flat_sel) => {
            for img in document.select(&flat_sel) {
                if let Some(src) = img.value().attr("src")
                    && src.contains(&selectors.image_host)
                {
                    urls.insert(resolve_original_url(src).to_string());
                }
            }
        }
        Err(_) => sink.warn("flat image selector failed to parse, skipping"),
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::HarvestEvent;

    struct NullSink;

    impl EventSink for NullSink {
        fn emit(&self, _event: HarvestEvent) {}
    }

    const PAGE_ONE: &str = r#"
        <html><body>
          <div class="YkRE5A9l4P">
            <img class="_3wVTRzzPzH" src="https://phinf.pstatic.net/r1/a.jpg?type=w200">
            <img class="_2SqzkWDFme" src="https://phinf.pstatic.net/r1/b.jpg?type=w200">
            <img class="_3wVTRzzPzH" src="https://ads.example.com/banner.jpg">
          </div>
          <div class="YkRE5A9l4P">
            <img class="_3wVTRzzPzH" src="https://phinf.pstatic.net/r2/a.jpg?type=w200">
          </div>
          <div class="_25CKxIKjAk">
            <img src="https://phinf.pstatic.net/flat/c.jpg?type=f80">
          </div>
        </body></html>
    "#;

    #[test]
    fn resolves_type_suffix() {
        assert_eq!(
            resolve_original_url("https://host/img.jpg?type=w200"),
            "https://host/img.jpg"
        );
    }

    #[test]
    fn resolves_generic_query() {
        assert_eq!(
            resolve_original_url("https://host/img.jpg?x=1&y=2"),
            "https://host/img.jpg"
        );
    }

    #[test]
    fn resolve_is_idempotent() {
        let once = resolve_original_url("https://host/img.jpg?type=w200");
        assert_eq!(resolve_original_url(once), once);
        assert_eq!(resolve_original_url("https://host/img.jpg"), "https://host/img.jpg");
    }

    #[test]
    fn collects_host_filtered_images() {
        let urls = collect_review_images(PAGE_ONE, &SiteSelectors::default(), &NullSink);

        assert_eq!(urls.len(), 4);
        assert!(urls.contains("https://phinf.pstatic.net/r1/a.jpg"));
        assert!(urls.contains("https://phinf.pstatic.net/r1/b.jpg"));
        assert!(urls.contains("https://phinf.pstatic.net/r2/a.jpg"));
        assert!(urls.contains("https://phinf.pstatic.net/flat/c.jpg"));
        assert!(!urls.iter().any(|u| u.contains("ads.example.com")));
    }

    #[test]
    fn empty_page_yields_empty_set() {
        let urls = collect_review_images("<html><body></body></html>", &SiteSelectors::default(), &NullSink);
        assert!(urls.is_empty());
    }

    #[test]
    fn same_asset_under_different_thumbnails_dedups_to_one() {
        // The same image served once as a w200 thumbnail and once as f640.
        // Raw URLs differ, so a set of unresolved URLs would hold two
        // entries; resolving before insertion collapses them to one.
        let page_a = r#"<div class="YkRE5A9l4P">
            <img class="_3wVTRzzPzH" src="https://phinf.pstatic.net/r/same.jpg?type=w200">
        </div>"#;
        let page_b = r#"<div class="YkRE5A9l4P">
            <img class="_3wVTRzzPzH" src="https://phinf.pstatic.net/r/same.jpg?type=f640">
        </div>"#;

        let raw: HashSet<String> = [
            "https://phinf.pstatic.net/r/same.jpg?type=w200".to_string(),
            "https://phinf.pstatic.net/r/same.jpg?type=f640".to_string(),
        ]
        .into();
        assert_eq!(raw.len(), 2);

        let selectors = SiteSelectors::default();
        let mut merged = collect_review_images(page_a, &selectors, &NullSink);
        merged.extend(collect_review_images(page_b, &selectors, &NullSink));
        assert_eq!(merged.len(), 1);
        assert!(merged.contains("https://phinf.pstatic.net/r/same.jpg"));
    }

    #[test]
    fn rescanning_a_page_is_idempotent() {
        let selectors = SiteSelectors::default();
        let first = collect_review_images(PAGE_ONE, &selectors, &NullSink);
        let second = collect_review_images(PAGE_ONE, &selectors, &NullSink);
        assert_eq!(first, second);
    }
}
