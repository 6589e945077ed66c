//! Structured role-tagged message list.

use crate::conversation::Turn;
use crate::prompt::recent_window;

/// System instruction that opens every message list.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Answer the user's latest \
message using the conversation so far. When web context is provided, prefer it for facts \
and cite sources as [Source N].";

/// Build `[system, recent history..., user]`.
///
/// With `context`, the final user message carries the context block before
/// the question.
#[must_use]
pub fn build_message_list(history: &[Turn], query: &str, context: Option<&str>) -> Vec<Turn> {
    let recent = recent_window(history);
    let mut messages = Vec::with_capacity(recent.len() + 2);

    messages.push(Turn::system(SYSTEM_INSTRUCTION));
    messages.extend(recent.iter().cloned());

    let question = match context {
        Some(context) => format!("Web context:\n{context}\n\nQuestion: {query}"),
        None => query.to_string(),
    };
    messages.push(Turn::user(question));

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::prompt::HISTORY_WINDOW;

    #[test]
    fn test_starts_with_system_and_ends_with_query() {
        let messages = build_message_list(&[Turn::assistant("earlier")], "now", None);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1], Turn::assistant("earlier"));
        assert_eq!(messages[2], Turn::user("now"));
    }

    #[test]
    fn test_history_is_windowed() {
        let history: Vec<Turn> = (0..12).map(|i| Turn::user(i.to_string())).collect();
        let messages = build_message_list(&history, "q", None);

        assert_eq!(messages.len(), HISTORY_WINDOW + 2);
        assert_eq!(messages[1].content, "6");
    }

    #[test]
    fn test_context_goes_into_user_message() {
        let messages = build_message_list(&[], "why?", Some("No web context available."));
        let last = messages.last().unwrap();

        assert_eq!(last.role, Role::User);
        assert!(last.content.starts_with("Web context:\nNo web context available."));
        assert!(last.content.ends_with("Question: why?"));
    }
}
