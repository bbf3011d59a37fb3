use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

mod collector;
mod downloader;
mod events;
mod harvester;
mod models;
mod session;
mod traits;

use events::{ChannelSink, HarvestEvent, Level};
use harvester::Harvester;

const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Download every review photo of a SmartStore product
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Product page URL (must contain a `products/<id>` segment)
    product_url: String,

    /// How many review pages to walk before stopping
    #[arg(long, default_value_t = 10)]
    max_pages: u32,

    /// Directory the per-product folder is created under
    #[arg(long, default_value = "./smartstore_reviews")]
    out: PathBuf,

    /// Run the browser without a visible window
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let webdriver_url =
        std::env::var("WEBDRIVER_URL").unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let harvester = Harvester::new(
        args.product_url,
        args.max_pages,
        args.out,
        webdriver_url,
        args.headless,
        Arc::new(ChannelSink::new(tx)),
    );

    let worker = tokio::spawn(async move { harvester.run().await });

    while let Some(event) = rx.recv().await {
        match event {
            HarvestEvent::Log { level, message } => match level {
                Level::Info => info!("{message}"),
                Level::Warn => warn!("{message}"),
                Level::Error => error!("{message}"),
            },
            HarvestEvent::PageDone {
                page,
                max_pages,
                images_found,
            } => info!("page {page}/{max_pages}: {images_found} images"),
            HarvestEvent::Finished { report } => info!(
                "download complete: {}/{} succeeded, {} failed",
                report.succeeded, report.attempted, report.failed
            ),
        }
    }

    match worker.await? {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("run failed: {e:#}");
            std::process::exit(1);
        }
    }
}
