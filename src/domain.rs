//! Domain module - vehicle listing entities, crawl requests and collaborator traits
//!
//! Entities are plain data: built fresh per page, immutable once returned,
//! and serializable into the output dataset.

pub mod crawl_request;
pub mod services;
pub mod vehicle;

pub use crawl_request::{CrawlRequest, RequestLabel};
pub use services::{PageFetcher, RecordSink};
pub use vehicle::{
    DealerDetail, DealerScore, Price, PriceRange, PriceRating, Review, ReviewDetails,
    SearchPageLinks, VehicleRecord,
};
