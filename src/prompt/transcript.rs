//! Single-string transcript prompt.

use crate::conversation::Turn;
use crate::prompt::recent_window;

/// Opening line of every transcript prompt.
pub const TRANSCRIPT_PREAMBLE: &str = "You are a helpful assistant. Continue this conversation:";

/// Build a newline-joined transcript of recent history followed by the query.
///
/// When `context` is given it is placed in a `Web context:` block ahead of
/// the transcript.
#[must_use]
pub fn build_transcript_prompt(history: &[Turn], query: &str, context: Option<&str>) -> String {
    let recent = recent_window(history);
    let mut lines: Vec<String> = Vec::with_capacity(recent.len() + 4);

    lines.push(TRANSCRIPT_PREAMBLE.to_string());
    if let Some(context) = context {
        lines.push("Web context:".to_string());
        lines.push(context.to_string());
        lines.push(String::new());
    }
    for turn in recent {
        lines.push(format!("{}: {}", turn.role.label(), turn.content));
    }
    lines.push(format!("User: {query}"));

    lines.join("\n")
}
