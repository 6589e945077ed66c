//! Prompt assembly.
//!
//! Two output shapes share the same inputs (recent history, query, optional
//! web context):
//! - `transcript`: one newline-joined string sent as a single user message
//! - `messages`: a role-tagged list opened by a fixed system instruction

pub mod context;
pub mod messages;
pub mod mindmap;
pub mod transcript;

pub use context::{NO_WEB_CONTEXT, build_context_block};
pub use messages::{SYSTEM_INSTRUCTION, build_message_list};
pub use mindmap::build_mindmap_prompt;
pub use transcript::build_transcript_prompt;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::conversation::Turn;

/// Number of stored turns (three exchanges) included in a prompt.
pub const HISTORY_WINDOW: usize = 6;

/// Shape of the prompt sent to the model.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStyle {
    /// One transcript string.
    #[default]
    Transcript,
    /// Structured message list.
    Messages,
}

impl PromptStyle {
    /// Stable string form used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transcript => "transcript",
            Self::Messages => "messages",
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "transcript" => Ok(Self::Transcript),
            "messages" => Ok(Self::Messages),
            _ => Err(value.to_string()),
        }
    }
}

/// The last [`HISTORY_WINDOW`] turns of `history`.
#[must_use]
pub fn recent_window(history: &[Turn]) -> &[Turn] {
    &history[history.len().saturating_sub(HISTORY_WINDOW)..]
}

/// Assemble the messages for one model call.
#[must_use]
pub fn assemble(
    style: PromptStyle,
    history: &[Turn],
    query: &str,
    context: Option<&str>,
) -> Vec<Turn> {
    match style {
        PromptStyle::Transcript => {
            vec![Turn::user(build_transcript_prompt(history, query, context))]
        }
        PromptStyle::Messages => build_message_list(history, query, context),
    }
}
