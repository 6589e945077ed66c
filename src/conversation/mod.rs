//! Conversation bookkeeping.
//!
//! - `turn`: role-tagged messages
//! - `title`: session title rules
//! - `store`: the [`ConversationStore`] trait shared by every backing
//! - `memory_store`: volatile in-process backing (default)
//! - `sqlite_store`: persistent `SQLite` backing

pub mod memory_store;
pub mod sqlite_store;
pub mod store;
pub mod title;
pub mod turn;

pub use memory_store::InMemoryConversationStore;
pub use sqlite_store::SqliteConversationStore;
pub use store::{
    ConversationStore, MAX_TURNS, SessionSummary, StoreError, StoreFuture, StoreResult,
};
pub use title::{DEFAULT_TITLE, TitleOrigin};
pub use turn::{Role, Turn};
