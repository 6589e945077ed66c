//! Session title rules.

use std::fmt;
use std::str::FromStr;

/// Title given to sessions created without a query.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Maximum title length (characters) accepted by a rename.
pub const MAX_TITLE_CHARS: usize = 100;

/// Number of query characters kept when a title is derived from a query.
pub const QUERY_TITLE_CHARS: usize = 50;

/// Where the current title of a session came from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TitleOrigin {
    /// Placeholder title; the first query may replace it.
    #[default]
    Default,
    /// Derived from the first query of the session.
    FirstQuery,
    /// Set through an explicit rename.
    Renamed,
}

impl TitleOrigin {
    /// Stable string form for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::FirstQuery => "first_query",
            Self::Renamed => "renamed",
        }
    }

    /// Whether a query-derived title may overwrite the current one.
    #[must_use]
    pub const fn accepts_query_title(self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Display for TitleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TitleOrigin {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "first_query" => Ok(Self::FirstQuery),
            "renamed" => Ok(Self::Renamed),
            _ => Err(value.to_string()),
        }
    }
}

/// Clamp a user-supplied title to [`MAX_TITLE_CHARS`].
#[must_use]
pub fn clamp_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

/// Derive a display title from the first query of a session.
#[must_use]
pub fn title_from_query(query: &str) -> String {
    let mut title: String = query.chars().take(QUERY_TITLE_CHARS).collect();
    if query.chars().count() > QUERY_TITLE_CHARS {
        title.push_str("...");
    }
    title
}
