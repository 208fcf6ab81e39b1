//! Parsing service layer
//!
//! High-level service owning both page parsers. Takes raw HTML strings so
//! callers never hold a parsed document across an `.await`.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use rayon::prelude::*;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::vehicle::{SearchPageLinks, VehicleRecord};
use crate::infrastructure::parsing::context::{DetailParseContext, SearchParseContext};
use crate::infrastructure::parsing::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use crate::infrastructure::parsing::{
    ContextualParser, ParsingConfig, SearchPageParser, VehicleDetailParser,
};

/// A fetched detail page awaiting extraction
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
}

impl FetchedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// High-level parsing service that coordinates parsing operations
pub struct ParsingService {
    search_parser: Arc<SearchPageParser>,
    detail_parser: Arc<VehicleDetailParser>,
    config: ParsingConfig,
}

impl ParsingService {
    /// Create a new parsing service logging extraction failures through `tracing`
    pub fn new(config: ParsingConfig) -> Result<Self> {
        Self::with_diagnostics(config, Arc::new(TracingDiagnostics))
    }

    /// Create a parsing service reporting extraction failures to `diagnostics`
    pub fn with_diagnostics(
        config: ParsingConfig,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self> {
        let search_parser = Arc::new(
            SearchPageParser::with_config(&config).context("Failed to create search page parser")?,
        );

        let detail_parser = Arc::new(
            VehicleDetailParser::with_config(&config)
                .context("Failed to create vehicle detail parser")?
                .with_diagnostics(diagnostics),
        );

        Ok(Self {
            search_parser,
            detail_parser,
            config,
        })
    }

    /// Harvest listing and pagination links from a search page
    pub fn parse_search(&self, html: &str, page_url: &str) -> SearchPageLinks {
        let html_doc = Html::parse_document(html);
        let context = SearchParseContext::new(self.config.base_url.as_str()).with_page_url(page_url);

        match self.search_parser.parse_with_context(&html_doc, &context) {
            Ok(links) => links,
            Err(e) => {
                debug!("Search page {} yielded no links: {}", page_url, e);
                SearchPageLinks::default()
            }
        }
    }

    /// Extract a vehicle record, `None` when the page could not be extracted
    pub fn parse_detail(&self, html: &str, url: &str, review_limit: usize) -> Option<VehicleRecord> {
        let html_doc = Html::parse_document(html);
        let context = DetailParseContext::new(url, review_limit);
        self.detail_parser.extract(&html_doc, &context)
    }

    /// Extract a batch of pages on the rayon pool
    ///
    /// Results line up with `pages`; the output equals sequential processing.
    pub fn parse_details_parallel(
        &self,
        pages: &[FetchedPage],
        review_limit: usize,
    ) -> Vec<Option<VehicleRecord>> {
        let records: Vec<_> = pages
            .par_iter()
            .map(|page| self.parse_detail(&page.html, &page.url, review_limit))
            .collect();

        info!(
            "Parsed {} of {} detail pages in parallel",
            records.iter().filter(|r| r.is_some()).count(),
            pages.len()
        );
        records
    }

    /// Get current configuration
    pub fn get_config(&self) -> &ParsingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::diagnostics::CapturedDiagnostics;

    fn detail_page(id: u32) -> FetchedPage {
        FetchedPage::new(
            format!("https://suchen.mobile.de/fahrzeuge/details.html?id={}", id),
            format!(
                r#"<h1 data-testid="ad-title">Volkswagen Golf {}</h1>
                   <span data-testid="price">{}.990 €</span>"#,
                id,
                10 + id
            ),
        )
    }

    #[test]
    fn test_parsing_service_creation() {
        let service = ParsingService::new(ParsingConfig::default());
        assert!(service.is_ok());
    }

    #[test]
    fn parallel_output_matches_sequential() {
        let service = ParsingService::new(ParsingConfig::default()).unwrap();
        let mut pages: Vec<FetchedPage> = (1..=16).map(detail_page).collect();
        pages.push(FetchedPage::new("", "<h1>no url</h1>"));

        let parallel = service.parse_details_parallel(&pages, 5);
        let sequential: Vec<_> = pages
            .iter()
            .map(|page| service.parse_detail(&page.html, &page.url, 5))
            .collect();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 17);
        assert!(parallel[16].is_none());
        assert_eq!(parallel[0].as_ref().unwrap().title, "Volkswagen Golf 1");
    }

    #[test]
    fn failures_reach_the_injected_sink() {
        let sink = Arc::new(CapturedDiagnostics::new());
        let service =
            ParsingService::with_diagnostics(ParsingConfig::default(), sink.clone()).unwrap();

        assert!(service.parse_detail("<h1>Golf</h1>", "", 5).is_none());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn search_links_use_configured_origin() {
        let service = ParsingService::new(ParsingConfig::default()).unwrap();
        let links = service.parse_search(
            r#"<a class="vehicle-link" href="/fahrzeuge/details.html?id=9">Golf</a>"#,
            "https://suchen.mobile.de/fahrzeuge/search.html",
        );
        assert_eq!(
            links.listing_links,
            vec!["https://suchen.mobile.de/fahrzeuge/details.html?id=9"]
        );
    }
}
