//! HTTP client for page fetching with pacing and retry handling
//!
//! Retries are purely a transport concern: failed or throttled requests are
//! retried here with exponential backoff, and the caller only ever sees a body
//! or a final error.

#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::services::PageFetcher;
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::parsing_error::ParsingError;

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Base delay before a retry, doubled on every further attempt
    pub retry_delay_ms: u64,
    /// Pause after every completed request
    pub request_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    /// Create HttpClientConfig from the crawler section of the app config
    pub fn from_crawler_config(crawler: &CrawlerConfig) -> Self {
        Self {
            timeout_seconds: crawler.request_timeout_seconds,
            max_retries: crawler.max_retries,
            retry_delay_ms: crawler.retry_delay_ms,
            request_delay_ms: crawler.request_delay_ms,
            user_agent: crawler.user_agent.clone(),
            follow_redirects: true,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_crawler_config(&CrawlerConfig::default())
    }
}

/// Statuses worth another attempt
pub fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// HTTP client with pacing, retries and error handling
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client from the crawler configuration
    pub fn from_crawler_config(crawler: &CrawlerConfig) -> Result<Self> {
        Self::with_config(HttpClientConfig::from_crawler_config(crawler))
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.config.retry_delay_ms.saturating_mul(factor))
    }

    /// Fetch HTML content as a string, retrying transient failures
    pub async fn fetch_html_string(&self, url: &str) -> Result<String> {
        let attempts = self.config.max_retries + 1;
        let mut last_err: Option<anyhow::Error> = None;

        for attempt in 1..=attempts {
            debug!("HTTP GET (attempt {}/{}): {}", attempt, attempts, url);

            let outcome = self.client.get(url).send().await;
            if self.config.request_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.request_delay_ms)).await;
            }

            match outcome {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let body = resp
                            .text()
                            .await
                            .map_err(|e| anyhow!("Failed to read response body: {}", e))?;
                        if body.is_empty() {
                            return Err(anyhow!("Empty response from {}", url));
                        }
                        debug!("Fetched {} bytes from {}", body.len(), url);
                        return Ok(body);
                    }

                    warn!("HTTP error {} on attempt {}: {}", status, attempt, url);
                    let error = ParsingError::HttpRequestFailed {
                        status: status.as_u16(),
                        message: status.canonical_reason().unwrap_or("unknown").to_string(),
                        url: url.to_string(),
                    };

                    if !is_retryable(status) || attempt == attempts {
                        return Err(error.into());
                    }

                    // Respect Retry-After if present on 429/503
                    let mut delay = self.backoff(attempt);
                    if let Some(retry_after) = resp
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                    {
                        delay = delay.max(Duration::from_secs(retry_after));
                    }
                    last_err = Some(error.into());
                    sleep(delay).await;
                }
                Err(e) => {
                    warn!("Network error on attempt {}: {}", attempt, e);
                    last_err = Some(anyhow!("HTTP request failed: {}", e));
                    if attempt < attempts {
                        sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Unknown HTTP error for {}", url)))
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        info!("Fetching: {}", url);
        self.fetch_html_string(url).await
    }
}
