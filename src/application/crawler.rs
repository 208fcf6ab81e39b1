//! Crawl driver for mobile.de search and detail pages
//!
//! Walks a breadth-first frontier starting from the configured start URLs:
//! search pages contribute listing links and the next results page, detail
//! pages are extracted and handed to the record sink.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::parsing_service::ParsingService;
use crate::domain::crawl_request::{CrawlRequest, RequestLabel};
use crate::domain::services::{PageFetcher, RecordSink};
use crate::infrastructure::config::ScraperInput;
use crate::infrastructure::search_url::build_search_url;

/// Counters reported once the frontier is drained
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    pub requests_handled: usize,
    pub search_pages: usize,
    pub items_scraped: usize,
    pub failed_requests: usize,
}

/// Initial frontier for an input
///
/// Explicit start URLs are classified by their path; without any, the search
/// URL built from the filters is used. Blank start URLs are dropped.
pub fn start_requests(input: &ScraperInput) -> Vec<CrawlRequest> {
    if input.start_urls.is_empty() {
        return vec![CrawlRequest::search(build_search_url(input))];
    }

    input
        .start_urls
        .iter()
        .map(|start| start.url().trim())
        .filter(|url| !url.is_empty())
        .map(CrawlRequest::classified)
        .collect()
}

/// Frontier with URL deduplication
#[derive(Debug, Default)]
struct Frontier {
    queue: VecDeque<CrawlRequest>,
    seen: HashSet<String>,
}

impl Frontier {
    /// Queue a request unless its URL was queued before
    fn push(&mut self, request: CrawlRequest) -> bool {
        if !self.seen.insert(request.url.clone()) {
            return false;
        }
        self.queue.push_back(request);
        true
    }

    fn pop(&mut self) -> Option<CrawlRequest> {
        self.queue.pop_front()
    }
}

/// Sequential crawler over injected transport and storage
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn RecordSink>,
    parsing: Arc<ParsingService>,
    input: ScraperInput,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn RecordSink>,
        parsing: Arc<ParsingService>,
        input: ScraperInput,
    ) -> Self {
        Self {
            fetcher,
            sink,
            parsing,
            input,
        }
    }

    fn limit_reached(&self, items_scraped: usize) -> bool {
        self.input
            .item_limit()
            .is_some_and(|limit| items_scraped >= limit)
    }

    /// Run the crawl until the frontier, the item cap or the request budget is exhausted
    pub async fn run(&self) -> Result<CrawlSummary> {
        let mut summary = CrawlSummary::default();
        let requests = start_requests(&self.input);

        if requests.is_empty() {
            warn!("No start requests could be built from the input, nothing to crawl");
            return Ok(summary);
        }

        let mut frontier = Frontier::default();
        for request in requests {
            frontier.push(request);
        }

        let budget = self.input.request_budget();
        info!(
            "Starting crawl: {} start request(s), item limit {:?}, request budget {:?}",
            frontier.queue.len(),
            self.input.item_limit(),
            budget
        );

        while let Some(request) = frontier.pop() {
            let attempted = summary.requests_handled + summary.failed_requests;
            if budget.is_some_and(|budget| attempted >= budget) {
                warn!("Request budget exhausted, {} request(s) left unvisited", frontier.queue.len() + 1);
                break;
            }

            if self.limit_reached(summary.items_scraped) {
                info!("Item limit reached, skipping {} queued request(s)", frontier.queue.len() + 1);
                break;
            }

            let html = match self.fetcher.fetch_page(&request.url).await {
                Ok(html) => html,
                Err(e) => {
                    error!("Failed to crawl {}: {:#}", request.url, e);
                    summary.failed_requests += 1;
                    continue;
                }
            };
            summary.requests_handled += 1;

            match request.label {
                RequestLabel::Search => {
                    summary.search_pages += 1;
                    self.handle_search_page(&request.url, &html, &mut frontier);
                }
                RequestLabel::Detail => {
                    if self.handle_detail_page(&request.url, &html).await {
                        summary.items_scraped += 1;
                        info!(
                            "Scraped item {}{}: {}",
                            summary.items_scraped,
                            self.input
                                .item_limit()
                                .map(|limit| format!("/{}", limit))
                                .unwrap_or_default(),
                            request.url
                        );
                    }
                }
            }
        }

        if let Err(e) = self.sink.flush().await {
            error!("Failed to flush records: {:#}", e);
        }

        info!(
            "Crawl finished: {} request(s), {} search page(s), {} item(s), {} failure(s)",
            summary.requests_handled,
            summary.search_pages,
            summary.items_scraped,
            summary.failed_requests
        );
        Ok(summary)
    }

    /// Queue the listing links and the next results page of a search page
    fn handle_search_page(&self, url: &str, html: &str, frontier: &mut Frontier) {
        let links = self.parsing.parse_search(html, url);
        if links.is_empty() {
            warn!("No listing links found on search page: {}", url);
            return;
        }

        let mut queued = 0;
        for link in links.listing_links {
            if frontier.push(CrawlRequest::detail(link)) {
                queued += 1;
            }
        }
        info!("Queued {} detail page(s) from {}", queued, url);

        if let Some(next) = links.next_page_link {
            if frontier.push(CrawlRequest::search(next.as_str())) {
                debug!("Queued next search page: {}", next);
            }
        }
    }

    /// Extract and store one detail page, `true` when a record was stored
    async fn handle_detail_page(&self, url: &str, html: &str) -> bool {
        let Some(record) = self
            .parsing
            .parse_detail(html, url, self.input.review_limit)
        else {
            return false;
        };
        if !record.has_content() {
            warn!("Detail page yielded no price, attributes, images or description: {}", url);
        }

        match self.sink.push_record(&record).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to store record {}: {:#}", url, e);
                false
            }
        }
    }
}
