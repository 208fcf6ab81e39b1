//! Configuration infrastructure
//!
//! Contains configuration loading and management for marketplace crawling.
//!
//! Configuration is organized into three sections:
//! 1. Scraper input (what to crawl, mirrors the dataset tooling's input shape)
//! 2. Crawler settings (transport pacing, retries, output location)
//! 3. Logging settings

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// What to crawl
    pub input: ScraperInput,

    /// How to crawl
    pub crawler: CrawlerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// A start URL, given either as a plain string or as `{ "url": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartUrl {
    Plain(String),
    Request { url: String },
}

impl StartUrl {
    pub fn url(&self) -> &str {
        match self {
            Self::Plain(url) | Self::Request { url } => url,
        }
    }
}

/// Crawl input: explicit start URLs, or search filters used to build one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScraperInput {
    pub start_urls: Vec<StartUrl>,

    /// Maximum number of records to emit, 0 means unlimited
    pub max_items: u32,

    /// Vehicle class (`Car`, `Motorbike`, ...)
    pub search_category: String,
    pub search_terms: Vec<String>,
    pub models: Vec<String>,
    pub mileage_km_min: Option<u32>,
    pub mileage_km_max: Option<u32>,
    pub power_kw_min: Option<u32>,
    pub power_kw_max: Option<u32>,
    pub price_min: Option<u32>,
    pub price_max: Option<u32>,
    pub registration_date_year_min: Option<u32>,
    pub registration_date_year_max: Option<u32>,

    /// Sort key such as `price-asc`; `relevance` and unknown keys sort by relevance
    pub sort: String,

    /// Maximum number of dealer reviews examined per listing
    pub review_limit: usize,
}

impl Default for ScraperInput {
    fn default() -> Self {
        Self {
            start_urls: Vec::new(),
            max_items: defaults::MAX_ITEMS,
            search_category: defaults::SEARCH_CATEGORY.to_string(),
            search_terms: Vec::new(),
            models: Vec::new(),
            mileage_km_min: None,
            mileage_km_max: None,
            power_kw_min: None,
            power_kw_max: None,
            price_min: None,
            price_max: None,
            registration_date_year_min: None,
            registration_date_year_max: None,
            sort: defaults::SORT.to_string(),
            review_limit: defaults::REVIEW_LIMIT,
        }
    }
}

impl ScraperInput {
    /// Item cap, `None` when unlimited
    pub fn item_limit(&self) -> Option<usize> {
        (self.max_items > 0).then_some(self.max_items as usize)
    }

    /// Total request budget: the item cap plus headroom for search pages
    pub fn request_budget(&self) -> Option<usize> {
        self.item_limit()
            .map(|limit| limit + defaults::REQUEST_BUDGET_HEADROOM)
    }
}

/// Transport and output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Delay after every request in milliseconds
    pub request_delay_ms: u64,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Retry attempts for a failed request (transport level only)
    pub max_retries: u32,

    /// Delay before a retry in milliseconds
    pub retry_delay_ms: u64,

    pub user_agent: String,

    /// JSON-lines dataset written by the crawl
    pub output_path: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_retries: defaults::MAX_RETRIES,
            retry_delay_ms: defaults::RETRY_DELAY_MS,
            user_agent: defaults::USER_AGENT.to_string(),
            output_path: PathBuf::from(defaults::DATASET_FILE_NAME),
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory, defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Name of the active log file
    pub file_name: String,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Keep only the most recent log file (delete all others)
    pub keep_only_latest: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            keep_only_latest: defaults::LOG_KEEP_ONLY_LATEST,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("selectors".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Configuration manager for the default location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Configuration manager for an explicit file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// A file that is not valid configuration is backed up as
    /// `*.json.corrupted` and replaced by defaults.
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("Configuration file is invalid: {}", parse_error);
                warn!("Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// mobile.de URLs and query conventions
pub mod mobile_de {
    /// Origin relative listing links are resolved against
    pub const SEARCH_ORIGIN: &str = "https://suchen.mobile.de";

    /// Search results page
    pub const SEARCH_PAGE_URL: &str = "https://suchen.mobile.de/fahrzeuge/search.html";

    /// Sort keys accepted in the input and the `sb` value each maps to
    pub const SORT_ORDERS: &[(&str, &str)] = &[
        ("relevance", "rel"),
        ("dateCreated-desc", "creationTime"),
        ("dateCreated-asc", "creationTime:asc"),
        ("price-asc", "price"),
        ("price-desc", "price:desc"),
        ("mileage-asc", "mileage"),
        ("mileage-desc", "mileage:desc"),
    ];

    /// `sb` value for relevance and unknown sort keys
    pub const DEFAULT_SORT_ORDER: &str = "rel";

    /// Search query parameter names
    pub mod params {
        pub const IS_SEARCH_REQUEST: &str = "isSearchRequest";
        pub const CATEGORY: &str = "s";
        pub const VEHICLE_CLASS: &str = "vc";
        pub const DAMAGED: &str = "dam";
        pub const MODELS: &str = "ms";
        pub const PRICE_MIN: &str = "ambit";
        pub const PRICE_MAX: &str = "prit";
        /// Single mileage bound, the maximum wins over the minimum
        pub const MILEAGE: &str = "mlx";
        /// Single power bound, the maximum wins over the minimum
        pub const POWER: &str = "pwt";
        pub const REGISTRATION_MIN: &str = "frn";
        pub const REGISTRATION_MAX: &str = "frx";
        pub const QUERY: &str = "q";
        pub const SORT_BY: &str = "sb";
    }
}

/// Default configuration values
pub mod defaults {
    /// Directory name under the user config directory
    pub const APP_DIR_NAME: &str = "vehicle-scraper";

    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Default item cap (unlimited)
    pub const MAX_ITEMS: u32 = 0;

    /// Requests allowed beyond the item cap, for search and pagination pages
    pub const REQUEST_BUDGET_HEADROOM: usize = 100;

    pub const SEARCH_CATEGORY: &str = "Car";

    pub const SORT: &str = "relevance";

    /// Default number of dealer reviews examined per listing
    pub const REVIEW_LIMIT: usize = 5;

    /// Default delay between requests in milliseconds
    pub const REQUEST_DELAY_MS: u64 = 1000;

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Default retry delay in milliseconds
    pub const RETRY_DELAY_MS: u64 = 2000;

    pub const USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

    pub const DATASET_FILE_NAME: &str = "dataset.jsonl";

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = true;

    pub const LOG_FILE_NAME: &str = "vehicle-scraper.log";

    /// Default maximum log files to keep
    pub const LOG_MAX_FILES: u32 = 5;

    /// Default auto cleanup logs setting
    pub const LOG_AUTO_CLEANUP: bool = true;

    /// Default keep only latest setting
    pub const LOG_KEEP_ONLY_LATEST: bool = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn input_mirrors_camel_case_shape() {
        let input: ScraperInput = serde_json::from_str(
            r#"{
                "startUrls": ["https://suchen.mobile.de/fahrzeuge/search.html?s=Car",
                              {"url": "https://suchen.mobile.de/fahrzeuge/details.html?id=1"}],
                "maxItems": 20,
                "priceMax": 30000,
                "reviewLimit": 2
            }"#,
        )
        .unwrap();

        assert_eq!(input.start_urls.len(), 2);
        assert_eq!(
            input.start_urls[1].url(),
            "https://suchen.mobile.de/fahrzeuge/details.html?id=1"
        );
        assert_eq!(input.price_max, Some(30000));
        assert_eq!(input.review_limit, 2);
        assert_eq!(input.search_category, "Car");
        assert_eq!(input.sort, "relevance");
    }

    #[test]
    fn request_budget_follows_item_cap() {
        let mut input = ScraperInput::default();
        assert_eq!(input.item_limit(), None);
        assert_eq!(input.request_budget(), None);

        input.max_items = 50;
        assert_eq!(input.item_limit(), Some(50));
        assert_eq!(input.request_budget(), Some(150));
    }

    #[tokio::test]
    async fn missing_config_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        let config = manager.load_config().await.unwrap();

        assert_eq!(config.input.review_limit, 5);
        assert!(manager.config_path().exists());
    }

    #[tokio::test]
    async fn saved_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        let mut config = AppConfig::default();
        config.input.max_items = 7;
        config.crawler.request_delay_ms = 250;
        manager.save_config(&config).await.unwrap();

        let loaded = manager.load_config().await.unwrap();
        assert_eq!(loaded.input.max_items, 7);
        assert_eq!(loaded.crawler.request_delay_ms, 250);
    }

    #[tokio::test]
    async fn corrupted_config_is_backed_up_and_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let manager = ConfigManager::with_path(&path);
        let config = manager.load_config().await.unwrap();

        assert_eq!(config.input.max_items, 0);
        let backup = std::fs::read_to_string(dir.path().join("config.json.corrupted")).unwrap();
        assert_eq!(backup, "{ not json");
    }
}
