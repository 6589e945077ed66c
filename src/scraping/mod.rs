//! Web search and page scraping used to enrich prompts.
//!
//! - DuckDuckGo HTML search for result URLs
//! - Page fetch with a short timeout and a browser-like user agent
//! - Readable-text extraction with navigation and markup noise removed
//!
//! Sources live for one request only; nothing is cached.

pub mod config;
pub mod content;
pub mod engines;
pub mod error;
pub mod types;

pub use config::{MAX_SOURCES, ScrapingConfig};
pub use error::ScrapingError;
pub use types::{MAX_SOURCE_CHARS, PageContent, SearchQuery, SearchResult, WebSource};

use std::future::Future;
use std::pin::Pin;

use futures::future::join_all;

/// Boxed future type for web context operations.
pub type ScrapeFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Supplies scraped web sources for a query.
///
/// Implementations never fail the request: unreachable pages are skipped and
/// a failed search yields no sources.
pub trait WebContext: Send + Sync {
    /// Search for `query` and scrape up to three result pages.
    fn gather<'a>(&'a self, query: &'a str) -> ScrapeFuture<'a, Vec<WebSource>>;
}

/// Scraping service backed by DuckDuckGo and direct page fetches.
pub struct ScrapingService {
    config: ScrapingConfig,
    client: reqwest::Client,
}

impl ScrapingService {
    /// Create a new scraping service with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ScrapingConfig) -> Result<Self, ScrapingError> {
        let client = Self::build_client(&config)?;
        Ok(Self { config, client })
    }

    /// Create a new scraping service with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, ScrapingError> {
        Self::new(ScrapingConfig::default())
    }

    /// Build an HTTP client with browser-like headers.
    fn build_client(config: &ScrapingConfig) -> Result<reqwest::Client, ScrapingError> {
        use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};

        let mut headers = HeaderMap::new();

        let ua = config.random_user_agent();
        if let Ok(ua_value) = HeaderValue::from_str(&ua) {
            headers.insert(USER_AGENT, ua_value);
        }

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ScrapingError::HttpClient(e.to_string()))
    }

    /// Search the web for result URLs.
    ///
    /// # Errors
    /// Returns an error if the search fails.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, ScrapingError> {
        engines::duckduckgo::search(&self.client, query).await
    }

    /// Fetch a page and extract its readable content.
    ///
    /// # Errors
    /// Returns an error if fetching or extraction fails.
    pub async fn scrape_url(&self, url: &str) -> Result<PageContent, ScrapingError> {
        content::scrape_page(&self.client, url, &self.config).await
    }

    /// Scrape one page into a source; failures are logged and dropped.
    async fn scrape_source(&self, url: &str) -> Option<WebSource> {
        match self.scrape_url(url).await {
            Ok(page) if !page.text.is_empty() => {
                let mut source = WebSource::from(page);
                source.content = types::truncate_chars(&source.content, self.config.max_source_chars);
                Some(source)
            }
            Ok(_) => {
                tracing::debug!(url, "Page had no readable text");
                None
            }
            Err(err) => {
                tracing::warn!(url, network = err.is_network(), "Skipping source: {err}");
                None
            }
        }
    }

    async fn gather_sources(&self, query: &str) -> Vec<WebSource> {
        let mut search = SearchQuery::new(query).with_max_results(self.config.max_sources);
        if let Some(region) = &self.config.region {
            search = search.with_region(region.clone());
        }

        let results = match self.search(&search).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!("Web search failed, continuing without context: {err}");
                return Vec::new();
            }
        };

        let urls: Vec<&str> = results
            .iter()
            .take(self.config.max_sources)
            .map(|r| r.url.as_str())
            .collect();
        tracing::debug!(count = urls.len(), "Scraping search results");

        join_all(urls.into_iter().map(|url| self.scrape_source(url)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

impl WebContext for ScrapingService {
    fn gather<'a>(&'a self, query: &'a str) -> ScrapeFuture<'a, Vec<WebSource>> {
        Box::pin(self.gather_sources(query))
    }
}
