//! Vehicle Scraper - mobile.de listing crawler
//!
//! Crawls mobile.de search results, extracts every vehicle detail page into a
//! normalized record and writes the records as a JSON-lines dataset.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub use application::{CrawlSummary, Crawler, ParsingService};
pub use infrastructure::{AppConfig, ConfigManager};

use infrastructure::parsing::ParsingConfig;
use infrastructure::{DatasetWriter, HttpClient};

/// Run a full crawl with the given configuration
pub async fn run(config: AppConfig) -> Result<CrawlSummary> {
    let fetcher = Arc::new(
        HttpClient::from_crawler_config(&config.crawler).context("Failed to create HTTP client")?,
    );
    let sink = Arc::new(
        DatasetWriter::open(&config.crawler.output_path)
            .await
            .context("Failed to open dataset")?,
    );
    let parsing = Arc::new(
        ParsingService::new(ParsingConfig::default()).context("Failed to create parsing service")?,
    );

    let crawler = Crawler::new(fetcher, sink.clone(), parsing, config.input);
    let summary = crawler.run().await?;

    info!("Dataset written to {:?}", sink.path());
    Ok(summary)
}
