//! Crawl collaborator traits
//!
//! The crawler drives extraction but leaves transport and persistence to
//! implementations of these traits.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::vehicle::VehicleRecord;

/// Fetches raw page markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the HTML body of `url`; transport retries happen inside
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Persists extracted records
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn push_record(&self, record: &VehicleRecord) -> Result<()>;

    /// Make every pushed record durable
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
