//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::conversation::{ConversationStore, InMemoryConversationStore};
use crate::llm::ChatModel;
use crate::prompt::PromptStyle;
use crate::scraping::WebContext;

/// Shared application state.
pub struct AppState {
    /// Session turns and titles.
    pub store: Arc<dyn ConversationStore>,
    /// Conversational model.
    pub model: Arc<dyn ChatModel>,
    /// Web context provider; `None` disables augmentation.
    pub web: Option<Arc<dyn WebContext>>,
    /// Prompt shape sent to the model.
    pub prompt_style: PromptStyle,
}

impl AppState {
    /// Create state with an in-memory store, no web context and the
    /// transcript prompt style.
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            store: Arc::new(InMemoryConversationStore::new()),
            model,
            web: None,
            prompt_style: PromptStyle::default(),
        }
    }

    /// Replace the conversation store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = store;
        self
    }

    /// Enable web context augmentation.
    #[must_use]
    pub fn with_web_context(mut self, web: Arc<dyn WebContext>) -> Self {
        self.web = Some(web);
        self
    }

    /// Set the prompt style.
    #[must_use]
    pub const fn with_prompt_style(mut self, style: PromptStyle) -> Self {
        self.prompt_style = style;
        self
    }

    /// Wrap into the shared handle used by the router.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
