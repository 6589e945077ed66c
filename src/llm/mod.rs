//! Conversational model clients.

pub mod error;
pub mod openai;

pub use error::{LlmError, LlmResult};
pub use openai::{LlmConfig, OpenAiChatClient};

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::conversation::Turn;

/// Text used when the model answers without any content.
pub const NO_RESPONSE: &str = "No response provided.";

/// Boxed future type for model calls.
pub type ModelFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A source link cited by the model or scraped for context.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceLink {
    /// Target URL.
    pub link: String,
    /// Human-readable title, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Reply of a single model call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModelReply {
    /// Assistant text.
    pub message: String,
    /// Sources cited by the model, if the backend reports any.
    pub sources: Vec<SourceLink>,
}

impl ModelReply {
    /// Build a reply without sources.
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sources: Vec::new(),
        }
    }
}

/// A conversational model that answers an ordered list of messages.
///
/// A single-string prompt is sent as one user message. Callers make exactly
/// one attempt per request.
pub trait ChatModel: Send + Sync {
    /// Run one completion.
    fn complete<'a>(&'a self, messages: &'a [Turn]) -> ModelFuture<'a, LlmResult<ModelReply>>;

    /// Identifier of the model answering requests.
    fn model_name(&self) -> &str;
}
