//! HTML extraction and normalization for marketplace pages
//!
//! Search-results pages go through `SearchPageParser`, vehicle detail pages
//! through `VehicleDetailParser`. Parsers compile their selectors once and
//! hold no mutable state, so a single instance can serve many threads.

pub mod attributes;
pub mod config;
pub mod context;
pub mod dealer_parser;
pub mod diagnostics;
pub mod error;
pub mod extractors;
pub mod price;
pub mod search_page_parser;
pub mod vehicle_detail_parser;

// Re-export public types
pub use attributes::AttributeAggregator;
pub use config::ParsingConfig;
pub use context::{DetailParseContext, SearchParseContext};
pub use dealer_parser::DealerDetailParser;
pub use diagnostics::{CapturedDiagnostics, DiagnosticsSink, NoopDiagnostics, TracingDiagnostics};
pub use error::{ParsingError, ParsingResult};
pub use price::parse_price;
pub use search_page_parser::SearchPageParser;
pub use vehicle_detail_parser::VehicleDetailParser;

use scraper::Html;

/// Parser trait with per-page context
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}
