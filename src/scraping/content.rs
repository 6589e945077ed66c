//! HTML fetching and readable-text extraction.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::scraping::config::ScrapingConfig;
use crate::scraping::error::ScrapingError;
use crate::scraping::types::PageContent;

/// Elements whose text never reaches the prompt.
const STRIPPED_ELEMENTS: [&str; 9] = [
    "script", "style", "nav", "footer", "form", "iframe", "img", "noscript", "svg",
];

/// Containers tried, in order, before falling back to the whole body.
const CONTENT_SELECTORS: [&str; 6] = [
    "article",
    "main",
    "[role='main']",
    ".post-content",
    ".article-content",
    "#content",
];

/// Minimum word count for a content container to be preferred over the body.
const MIN_CONTAINER_WORDS: usize = 50;

/// Fetch a web page and extract its readable text.
///
/// # Errors
/// Returns an error if the URL is invalid, the request fails, or the page is
/// not HTML or plain text.
pub async fn scrape_page(
    client: &reqwest::Client,
    url: &str,
    config: &ScrapingConfig,
) -> Result<PageContent, ScrapingError> {
    Url::parse(url)?;

    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(ScrapingError::HttpClient(format!(
            "{url} returned status: {}",
            response.status()
        )));
    }

    if let Some(len) = response.content_length() {
        if usize::try_from(len).map_or(true, |len| len > config.max_content_length) {
            return Err(ScrapingError::ExtractionFailed(format!(
                "Content too large: {len} bytes"
            )));
        }
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("text/plain") {
        return Err(ScrapingError::UnsupportedContentType(content_type));
    }

    let body = response.text().await?;
    if content_type.contains("text/plain") {
        return Ok(PageContent {
            url: url.to_string(),
            title: String::new(),
            text: clean_text(&body),
        });
    }

    Ok(extract_content(&body, url))
}

/// Extract title and readable text from an HTML document.
#[must_use]
pub fn extract_content(html: &str, url: &str) -> PageContent {
    let document = Html::parse_document(html);
    PageContent {
        url: url.to_string(),
        title: extract_title(&document),
        text: extract_main_text(&document),
    }
}

/// Extract page title.
fn extract_title(document: &Html) -> String {
    if let Ok(selector) = Selector::parse("meta[property='og:title']") {
        if let Some(content) = document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("content"))
        {
            let content = content.trim();
            if !content.is_empty() {
                return content.to_string();
            }
        }
    }

    if let Ok(selector) = Selector::parse("title") {
        if let Some(element) = document.select(&selector).next() {
            let title = clean_text(&element.text().collect::<String>());
            if !title.is_empty() {
                return title;
            }
        }
    }

    String::new()
}

/// Extract the main readable text, preferring article-like containers.
fn extract_main_text(document: &Html) -> String {
    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = readable_text(element);
                if text.split_whitespace().count() > MIN_CONTAINER_WORDS {
                    return text;
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            return readable_text(body);
        }
    }

    readable_text(document.root_element())
}

/// Collect the text under `root`, skipping anything inside a stripped element.
fn readable_text(root: ElementRef<'_>) -> String {
    let mut pieces: Vec<&str> = Vec::new();

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| STRIPPED_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            pieces.push(trimmed);
        }
    }

    clean_text(&pieces.join(" "))
}

/// Collapse whitespace runs into single spaces.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
