//! Application layer module
//!
//! Orchestrates the crawl: the parsing service owns the page parsers and the
//! crawler drives fetching, extraction and storage.

pub mod crawler;
pub mod parsing_service;

pub use crawler::{start_requests, CrawlSummary, Crawler};
pub use parsing_service::{FetchedPage, ParsingService};
