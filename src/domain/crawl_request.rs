use serde::{Deserialize, Serialize};
use std::fmt;

/// Path marker identifying a vehicle detail page
pub const DETAIL_PAGE_MARKER: &str = "/details.html";

/// Page classification deciding which parser handles a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestLabel {
    Search,
    Detail,
}

impl RequestLabel {
    /// Classify a URL: anything pointing at a details page is DETAIL
    pub fn classify(url: &str) -> Self {
        if url.contains(DETAIL_PAGE_MARKER) {
            Self::Detail
        } else {
            Self::Search
        }
    }
}

impl fmt::Display for RequestLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search => write!(f, "SEARCH"),
            Self::Detail => write!(f, "DETAIL"),
        }
    }
}

/// A single unit of work for the crawl frontier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    pub label: RequestLabel,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>, label: RequestLabel) -> Self {
        Self {
            url: url.into(),
            label,
        }
    }

    /// Build a request whose label is inferred from the URL
    pub fn classified(url: impl Into<String>) -> Self {
        let url = url.into();
        let label = RequestLabel::classify(&url);
        Self { url, label }
    }

    pub fn search(url: impl Into<String>) -> Self {
        Self::new(url, RequestLabel::Search)
    }

    pub fn detail(url: impl Into<String>) -> Self {
        Self::new(url, RequestLabel::Detail)
    }
}
