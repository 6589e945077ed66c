//! DuckDuckGo search engine implementation.
//!
//! Uses DuckDuckGo HTML search (no API key required).

use scraper::{Html, Selector};
use url::Url;

use crate::scraping::error::ScrapingError;
use crate::scraping::types::{SearchQuery, SearchResult};

/// Base URL for DuckDuckGo HTML search.
const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// Perform a search on DuckDuckGo.
///
/// # Errors
/// Returns an error if the search request fails or parsing fails.
pub async fn search(
    client: &reqwest::Client,
    query: &SearchQuery,
) -> Result<Vec<SearchResult>, ScrapingError> {
    let params = build_params(query);

    let response = client.post(DDG_HTML_URL).form(&params).send().await?;

    if !response.status().is_success() {
        return Err(ScrapingError::HttpClient(format!(
            "DuckDuckGo returned status: {}",
            response.status()
        )));
    }

    let html = response.text().await?;
    parse_results(&html, query.max_results)
}

/// Build form parameters for DuckDuckGo search.
fn build_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", query.query.clone()), ("b", String::new())];

    if let Some(region) = &query.region {
        params.push(("kl", format!("{region}-{region}")));
    }

    params
}

fn selector(css: &str) -> Result<Selector, ScrapingError> {
    Selector::parse(css).map_err(|e| ScrapingError::HtmlParse(format!("Invalid selector: {e:?}")))
}

/// Parse DuckDuckGo HTML results.
fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>, ScrapingError> {
    let document = Html::parse_document(html);

    let result_selector = selector(".result")?;
    let title_selector = selector(".result__a")?;
    let snippet_selector = selector(".result__snippet")?;
    let url_selector = selector(".result__url")?;

    let mut results = Vec::new();

    for element in document.select(&result_selector) {
        if results.len() >= max_results {
            break;
        }

        let Some(anchor) = element.select(&title_selector).next() else {
            continue;
        };

        let title = anchor.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let url = anchor
            .value()
            .attr("href")
            .map(extract_url_from_ddg_redirect)
            .unwrap_or_default();

        // Sponsored results point back into duckduckgo.com.
        if url.is_empty() || url.contains("duckduckgo.com/y.js") {
            continue;
        }

        let description = element
            .select(&snippet_selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let display_url = element
            .select(&url_selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let domain = extract_domain(&url).unwrap_or(display_url);

        results.push(SearchResult {
            title,
            url,
            description,
            domain,
        });
    }

    if results.is_empty() {
        tracing::warn!("No results found in DuckDuckGo HTML response");
    }

    Ok(results)
}

/// Extract the actual URL from DuckDuckGo's redirect URL.
fn extract_url_from_ddg_redirect(href: &str) -> String {
    // DuckDuckGo uses redirect URLs like:
    // //duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...
    if let Some(uddg_start) = href.find("uddg=") {
        let start = uddg_start + 5;
        let end = href[start..].find('&').map_or(href.len(), |i| start + i);
        let encoded = &href[start..end];
        urlencoding::decode(encoded)
            .map_or_else(|_| encoded.to_string(), std::borrow::Cow::into_owned)
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    }
}

/// Extract domain from URL.
fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <div class="result">
          <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F&rut=1">The Rust Book</a>
          <a class="result__snippet">Learn Rust.</a>
          <span class="result__url">doc.rust-lang.org</span>
        </div>
        <div class="result">
          <a class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x">Sponsored</a>
        </div>
        <div class="result">
          <a class="result__a" href="https://www.rust-lang.org/">Rust Language</a>
        </div>
        <div class="result">
          <a class="result__a" href="https://crates.io/">crates.io</a>
        </div>"#;

    #[test]
    fn test_build_params() {
        let query = SearchQuery::new("rust programming").with_region("us");
        let params = build_params(&query);

        assert!(params.iter().any(|(k, v)| *k == "q" && v == "rust programming"));
        assert!(params.iter().any(|(k, v)| *k == "kl" && v == "us-us"));
    }

    #[test]
    fn test_extract_url_from_ddg_redirect() {
        let redirect = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=123";
        let url = extract_url_from_ddg_redirect(redirect);
        assert_eq!(url, "https://example.com/page");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://www.example.com/page"),
            Some("www.example.com".to_string())
        );
        assert_eq!(extract_domain("invalid"), None);
    }

    #[test]
    fn test_parse_results_skips_ads_and_respects_limit() {
        let results = parse_results(RESULTS_PAGE, 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://doc.rust-lang.org/book/");
        assert_eq!(results[0].description, "Learn Rust.");
        assert_eq!(results[0].domain, "doc.rust-lang.org");
        assert_eq!(results[1].url, "https://www.rust-lang.org/");
    }
}
