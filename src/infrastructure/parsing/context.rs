//! Parsing context for listing extraction
//!
//! Carries the per-page inputs that are not part of the markup itself.

/// Context for a search-results page
#[derive(Debug, Clone)]
pub struct SearchParseContext {
    /// URL the page was fetched from, used only for diagnostics
    pub page_url: Option<String>,

    /// Origin relative links are resolved against
    pub base_url: String,
}

impl SearchParseContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            page_url: None,
            base_url: base_url.into(),
        }
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = Some(page_url.into());
        self
    }
}

/// Context for a vehicle detail page
#[derive(Debug, Clone)]
pub struct DetailParseContext {
    /// Source URL of the page, becomes the record key
    pub url: String,

    /// Maximum number of review elements examined; 0 disables reviews
    pub review_limit: usize,
}

impl DetailParseContext {
    pub fn new(url: impl Into<String>, review_limit: usize) -> Self {
        Self {
            url: url.into(),
            review_limit,
        }
    }
}
