//! Candidate extraction and text repair applied before parsing.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a comma followed only by whitespace before a closing bracket/brace.
static TRAILING_COMMA: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").ok());

/// Cut model output down to the span from the first `{` to the last `}`.
///
/// Falls back to the trimmed text when either brace is missing. The span is
/// not balance-checked: several JSON fragments or stray braces in prose give
/// an invalid candidate that the parser then rejects, and a `}` appearing only
/// before the first `{` gives an empty candidate.
#[must_use]
pub fn extract_json_candidate(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end >= start => &raw[start..=end],
        (Some(_), Some(_)) => "",
        _ => raw.trim(),
    }
}

/// Remove trailing commas and turn every single quote into a double quote.
#[must_use]
pub fn repair_json_text(text: &str) -> String {
    let without_commas = match TRAILING_COMMA.as_ref() {
        Some(re) => re.replace_all(text, "$1").into_owned(),
        None => text.to_string(),
    };
    without_commas.replace('\'', "\"")
}
