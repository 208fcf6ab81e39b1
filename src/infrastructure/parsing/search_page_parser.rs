//! Search-results page parser
//!
//! Harvests listing links and the pagination link. Links are resolved against
//! the search origin and filtered to detail pages; deduplication across pages
//! is left to the crawl frontier.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::config::ParsingConfig;
use super::context::SearchParseContext;
use super::extractors::{compile_group, SelectorChain};
use super::{ContextualParser, ParsingError, ParsingResult};
use crate::domain::vehicle::SearchPageLinks;

/// Parser for search-results pages
#[derive(Debug, Clone)]
pub struct SearchPageParser {
    listing_link: Selector,
    next_page: SelectorChain,
    detail_marker: String,
    base_url: String,
}

impl SearchPageParser {
    /// Create a new search page parser with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> Result<Self> {
        let selectors = &config.search_page;
        Ok(Self {
            listing_link: compile_group(&selectors.listing_link)?,
            next_page: SelectorChain::compile("next_page", &selectors.next_page)?,
            detail_marker: selectors.detail_marker.clone(),
            base_url: config.base_url.clone(),
        })
    }

    /// Harvest links resolved against the configured origin
    ///
    /// An unusable origin yields an empty link set.
    pub fn parse(&self, html: &Html) -> SearchPageLinks {
        let context = SearchParseContext::new(self.base_url.as_str());
        self.parse_with_context(html, &context).unwrap_or_else(|e| {
            debug!("Search page harvesting failed: {}", e);
            SearchPageLinks::default()
        })
    }

    fn resolve(base: &Url, href: &str) -> Option<String> {
        match base.join(href.trim()) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                debug!("Skipping unresolvable link '{}': {}", href, e);
                None
            }
        }
    }
}

impl ContextualParser for SearchPageParser {
    type Output = SearchPageLinks;
    type Context = SearchParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        let base = Url::parse(&context.base_url).map_err(|e| ParsingError::UrlResolutionFailed {
            url: context.base_url.clone(),
            reason: e.to_string(),
            base_url: None,
        })?;

        let root = html.root_element();

        let listing_links: Vec<String> = root
            .select(&self.listing_link)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter(|href| !href.trim().is_empty())
            .filter_map(|href| Self::resolve(&base, href))
            .filter(|url| url.contains(&self.detail_marker))
            .collect();

        let next_page_link = self
            .next_page
            .first_attr(root, "href")
            .and_then(|href| Self::resolve(&base, &href));

        debug!(
            "Harvested {} listing links from {} (next page: {})",
            listing_links.len(),
            context.page_url.as_deref().unwrap_or("<unknown>"),
            next_page_link.is_some()
        );

        Ok(SearchPageLinks {
            listing_links,
            next_page_link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links_resolve_against_search_origin() {
        let html = Html::parse_document(
            r#"<a data-testid="listing-link" href="/fahrzeuge/details.html?id=1">one</a>
               <a class="vehicle-link" href="https://suchen.mobile.de/fahrzeuge/details.html?id=2">two</a>
               <a class="pagination-next" href="/fahrzeuge/search.html?pageNumber=2">next</a>"#,
        );
        let links = SearchPageParser::new().unwrap().parse(&html);

        assert_eq!(
            links.listing_links,
            vec![
                "https://suchen.mobile.de/fahrzeuge/details.html?id=1",
                "https://suchen.mobile.de/fahrzeuge/details.html?id=2",
            ]
        );
        assert_eq!(
            links.next_page_link.as_deref(),
            Some("https://suchen.mobile.de/fahrzeuge/search.html?pageNumber=2")
        );
    }

    #[test]
    fn non_detail_links_are_dropped_and_duplicates_kept() {
        let html = Html::parse_document(
            r#"<a data-testid="listing-link" href="/fahrzeuge/details.html?id=1">one</a>
               <a data-testid="listing-link" href="/fahrzeuge/details.html?id=1">again</a>
               <a data-testid="listing-link" href="/werbung/banner.html">ad</a>
               <a data-testid="listing-link">no href</a>"#,
        );
        let links = SearchPageParser::new().unwrap().parse(&html);

        assert_eq!(links.listing_links.len(), 2);
        assert_eq!(links.next_page_link, None);
    }

    #[test]
    fn page_without_links_is_empty() {
        let html = Html::parse_document("<p>Keine Treffer</p>");
        assert!(SearchPageParser::new().unwrap().parse(&html).is_empty());
    }

    #[test]
    fn invalid_origin_is_a_resolution_error() {
        let parser = SearchPageParser::new().unwrap();
        let html = Html::parse_document("<p></p>");
        let result = parser.parse_with_context(&html, &SearchParseContext::new("not a url"));
        assert!(matches!(result, Err(ParsingError::UrlResolutionFailed { .. })));
    }
}
