//! Sequential download of collected review images

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use reqwest::header::REFERER;

use crate::collector::resolve_original_url;
use crate::models::{DownloadReport, ProductId};
use crate::traits::EventSink;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
// The storefront rejects anonymous-looking requests, so present a browser
// user agent and a referer matching the product page.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches one image by URL. Seam between the batch loop and the HTTP
/// client so the loop's accounting can run without a network.
trait ImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct Downloader {
    client: Client,
    referer: String,
}

impl Downloader {
    /// Build a client sending the product page as referer on every fetch.
    pub fn new(product_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            referer: product_url.to_string(),
        })
    }

    /// Fetch every collected URL into `dir`, one at a time, in lexicographic
    /// order so filenames are stable across runs. A failed fetch or write is
    /// counted and reported but never aborts the batch.
    pub async fn download_all(
        &self,
        urls: &HashSet<String>,
        dir: &Path,
        product_id: &ProductId,
        sink: &dyn EventSink,
    ) -> DownloadReport {
        download_batch(self, urls, dir, product_id, sink).await
    }
}

impl ImageFetcher for Downloader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header(REFERER, &self.referer)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("HTTP {}", response.status()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

async fn download_batch(
    fetcher: &impl ImageFetcher,
    urls: &HashSet<String>,
    dir: &Path,
    product_id: &ProductId,
    sink: &dyn EventSink,
) -> DownloadReport {
    let mut ordered: Vec<&String> = urls.iter().collect();
    ordered.sort();

    let total = ordered.len();
    let mut report = DownloadReport::default();

    for (idx, url) in ordered.into_iter().enumerate() {
        report.attempted += 1;
        let filename = format!("review_{}_{:04}.jpg", product_id, idx + 1);
        let path = unique_path(dir.join(filename)).await;
        let original = resolve_original_url(url);

        match fetcher.fetch(original).await {
            Ok(bytes) => match tokio::fs::write(&path, &bytes).await {
                Ok(()) => {
                    report.succeeded += 1;
                    sink.info(&format!(
                        "[{}/{}] saved {}",
                        idx + 1,
                        total,
                        path.file_name().and_then(|n| n.to_str()).unwrap_or("?")
                    ));
                }
                Err(e) => {
                    report.failed += 1;
                    sink.error(&format!("[{}/{}] write failed: {e}", idx + 1, total));
                }
            },
            Err(e) => {
                report.failed += 1;
                sink.error(&format!("[{}/{}] {e}", idx + 1, total));
            }
        }
    }

    report
}

/// Find a free path by appending `_1`, `_2`, ... before the extension.
///
/// Collision avoidance only; two distinct images that happen to target the
/// same name both end up on disk under different names.
pub async fn unique_path(path: PathBuf) -> PathBuf {
    if !exists(&path).await {
        return path;
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file")
        .to_string();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_string);
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut counter = 1;
    loop {
        let name = match &ext {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        let candidate = parent.join(name);
        if !exists(&candidate).await {
            return candidate;
        }
        counter += 1;
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
