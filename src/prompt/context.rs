//! Context block built from scraped web sources.

use crate::scraping::{MAX_SOURCE_CHARS, MAX_SOURCES, WebSource};
use crate::scraping::types::truncate_chars;

/// Block emitted when no source could be scraped.
pub const NO_WEB_CONTEXT: &str = "No web context available.";

/// Format sources as numbered `[Source N - URL]` sections.
///
/// At most [`MAX_SOURCES`] sources are rendered, each with at most
/// [`MAX_SOURCE_CHARS`] characters of content.
#[must_use]
pub fn build_context_block(sources: &[WebSource]) -> String {
    if sources.is_empty() {
        return NO_WEB_CONTEXT.to_string();
    }

    sources
        .iter()
        .take(MAX_SOURCES)
        .enumerate()
        .map(|(idx, source)| {
            format!(
                "[Source {} - {}]\n{}",
                idx + 1,
                source.url,
                truncate_chars(&source.content, MAX_SOURCE_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
