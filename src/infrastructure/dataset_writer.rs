//! Dataset output: one JSON record per line

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::services::RecordSink;
use crate::domain::vehicle::VehicleRecord;

/// Appends records to a JSON-lines file
pub struct DatasetWriter {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl DatasetWriter {
    /// Open `path` for appending, creating it and its directory as needed
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create dataset directory: {:?}", parent))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open dataset file: {:?}", path))?;

        info!("Writing dataset to: {:?}", path);
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for DatasetWriter {
    async fn push_record(&self, record: &VehicleRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record).context("Failed to serialize record")?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .context("Failed to write record")?;
        debug!("Stored record: {}", record.url);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .await
            .flush()
            .await
            .context("Failed to flush dataset")
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: StdMutex<Vec<VehicleRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<VehicleRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn push_record(&self, record: &VehicleRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("Record store poisoned"))?
            .push(record.clone());
        Ok(())
    }
}

/// Read a JSON-lines dataset back into records
pub async fn read_dataset(path: impl AsRef<Path>) -> Result<Vec<VehicleRecord>> {
    let content = fs::read_to_string(path.as_ref())
        .await
        .with_context(|| format!("Failed to read dataset: {:?}", path.as_ref()))?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid record on line {}", i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record(url: &str) -> VehicleRecord {
        VehicleRecord {
            title: "Audi A4 Avant".to_string(),
            url: url.to_string(),
            id: Some(1),
            rank: None,
            preview_image: String::new(),
            images: Vec::new(),
            price: None,
            created_date: None,
            modified_date: None,
            description: None,
            attributes: BTreeMap::new(),
            features: Vec::new(),
            brand: Some("Audi".to_string()),
            model: None,
            category: None,
            segment: None,
            mileage: None,
            first_registration: None,
            dealer_details: None,
            price_rating: None,
        }
    }

    #[tokio::test]
    async fn records_are_written_one_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("dataset.jsonl");

        let writer = DatasetWriter::open(&path).await.unwrap();
        writer.push_record(&record("https://a/details.html?id=1")).await.unwrap();
        writer.push_record(&record("https://a/details.html?id=2")).await.unwrap();
        writer.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("\"previewImage\":\"\""));

        let records = read_dataset(&path).await.unwrap();
        assert_eq!(records[1].url, "https://a/details.html?id=2");
    }

    #[tokio::test]
    async fn memory_sink_collects_records() {
        let sink = MemorySink::new();
        sink.push_record(&record("https://a/details.html?id=3")).await.unwrap();
        assert_eq!(sink.records().len(), 1);
    }
}
