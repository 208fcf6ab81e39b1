//! Domain services
//!
//! Interfaces of the collaborators the crawl depends on.

pub mod crawling_services;

pub use crawling_services::{PageFetcher, RecordSink};
