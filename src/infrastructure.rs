//! Infrastructure layer for parsing, fetching, configuration and output
//!
//! This module provides the HTML extraction engine, the HTTP transport,
//! configuration management, logging and the dataset writer.

pub mod config; // Configuration constants and helpers
pub mod dataset_writer; // JSON-lines output
pub mod logging; // Logging infrastructure
pub mod parsing; // Listing extraction and normalization
pub mod parsing_error; // Error types
pub mod search_url; // Search URL builder
pub mod simple_http_client;

// Re-export commonly used items
pub use config::{mobile_de, AppConfig, ConfigManager, ScraperInput};
pub use dataset_writer::{DatasetWriter, MemorySink};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{
    ParsingConfig, ParsingError, ParsingResult, SearchPageParser, VehicleDetailParser,
};
pub use search_url::build_search_url;
pub use simple_http_client::{HttpClient, HttpClientConfig};
