//! Diagnostics side channel for extraction failures
//!
//! The record builder never propagates a failure; it reports it here once and
//! returns `None`. Production code logs through `tracing`, tests capture.

use std::sync::Mutex;
use tracing::error;

use super::ParsingError;

/// Receiver of extraction failure notices
pub trait DiagnosticsSink: Send + Sync {
    /// Called once per page whose extraction failed
    fn extraction_failed(&self, url: &str, cause: &ParsingError);
}

/// Emits one structured `tracing` error event per failure
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn extraction_failed(&self, url: &str, cause: &ParsingError) {
        error!(url = %url, cause = %cause, "Error extracting vehicle details");
    }
}

/// Discards every notice
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn extraction_failed(&self, _url: &str, _cause: &ParsingError) {}
}

/// A captured failure notice
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEntry {
    pub url: String,
    pub cause: ParsingError,
}

/// Keeps notices in memory for later inspection
#[derive(Debug, Default)]
pub struct CapturedDiagnostics {
    entries: Mutex<Vec<DiagnosticEntry>>,
}

impl CapturedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notices received so far
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticsSink for CapturedDiagnostics {
    fn extraction_failed(&self, url: &str, cause: &ParsingError) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(DiagnosticEntry {
                url: url.to_string(),
                cause: cause.clone(),
            });
        }
    }
}
