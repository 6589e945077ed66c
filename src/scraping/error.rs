//! Error types for the scraping module.

use thiserror::Error;

/// Errors that can occur during search and scraping.
#[derive(Debug, Error)]
pub enum ScrapingError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error or unexpected status.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTML parsing error.
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// Content extraction failed.
    #[error("Content extraction failed: {0}")]
    ExtractionFailed(String),

    /// Content type not supported.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
}

impl ScrapingError {
    /// Whether the failure came from the network rather than the page itself.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::HttpRequest(_) | Self::HttpClient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classification() {
        assert!(ScrapingError::HttpClient("503".to_string()).is_network());
        assert!(!ScrapingError::ExtractionFailed("empty".to_string()).is_network());
    }
}
