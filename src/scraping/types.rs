//! Core types for search and scraping results.

use serde::{Deserialize, Serialize};

/// Maximum characters of page text kept per source.
pub const MAX_SOURCE_CHARS: usize = 800;

/// A search query with parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search query string.
    pub query: String,
    /// Maximum number of results to return.
    pub max_results: usize,
    /// Region filter (e.g., "us", "fr").
    pub region: Option<String>,
}

impl SearchQuery {
    /// Create a new search query with default settings.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: 10,
            region: None,
        }
    }

    /// Set max results.
    #[must_use]
    pub const fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set region filter.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// A single search result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the result.
    pub title: String,
    /// URL of the result.
    pub url: String,
    /// Description or snippet.
    pub description: String,
    /// Source domain.
    pub domain: String,
}

/// Readable content extracted from a fetched page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageContent {
    /// Requested URL.
    pub url: String,
    /// Page title.
    pub title: String,
    /// Readable text with navigation and markup noise removed.
    pub text: String,
}

/// One scraped page used as prompt context for a single request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    /// Page URL.
    pub url: String,
    /// Page title, possibly empty.
    pub title: String,
    /// Page text, at most [`MAX_SOURCE_CHARS`] characters.
    pub content: String,
}

impl WebSource {
    /// Build a source, truncating the content to [`MAX_SOURCE_CHARS`].
    #[must_use]
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: &str) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: truncate_chars(content, MAX_SOURCE_CHARS),
        }
    }
}

impl From<PageContent> for WebSource {
    fn from(page: PageContent) -> Self {
        Self::new(page.url, page.title, &page.text)
    }
}

/// Keep the first `max` characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
