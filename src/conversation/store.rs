//! Conversation store abstraction.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::turn::Turn;

/// Maximum number of turns retained per session.
pub const MAX_TURNS: usize = 20;

/// Boxed future type for conversation store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Conversation store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// A stored row could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Convenience result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Identifier and display title of a session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// Storage for session turns and titles.
///
/// Unknown session ids are never an error: reads return empty results and
/// mutations that need an existing session report `false`.
pub trait ConversationStore: Send + Sync {
    /// Create (or reset) a session with no turns and the default title.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn create(&self, id: &str) -> StoreFuture<'_, StoreResult<SessionSummary>>;

    /// List every session in creation order.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn list(&self) -> StoreFuture<'_, StoreResult<Vec<SessionSummary>>>;

    /// Append turns, creating the session if needed, then keep only the
    /// last [`MAX_TURNS`] turns.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn append(&self, id: &str, turns: Vec<Turn>) -> StoreFuture<'_, StoreResult<()>>;

    /// Load the stored turns, oldest first. Empty for unknown sessions.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get(&self, id: &str) -> StoreFuture<'_, StoreResult<Vec<Turn>>>;

    /// Remove all turns of an existing session. Returns `false` if unknown.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn clear(&self, id: &str) -> StoreFuture<'_, StoreResult<bool>>;

    /// Remove a session with its turns and title. Idempotent.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete(&self, id: &str) -> StoreFuture<'_, StoreResult<()>>;

    /// Set an explicit title (clamped to 100 characters). Returns `false`
    /// if the session is unknown.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn rename(&self, id: &str, title: &str) -> StoreFuture<'_, StoreResult<bool>>;

    /// Derive the title from a query unless one was already assigned by a
    /// rename or an earlier query. Returns `true` if the title changed.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn assign_title_from_query(&self, id: &str, query: &str)
    -> StoreFuture<'_, StoreResult<bool>>;

    /// Drop sessions with no activity for longer than `max_idle`.
    /// Returns the number of sessions removed.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn evict_idle(&self, max_idle: Duration) -> StoreFuture<'_, StoreResult<usize>>;
}

/// Drop the oldest turns so at most [`MAX_TURNS`] remain.
pub fn retain_recent(turns: &mut Vec<Turn>) {
    if turns.len() > MAX_TURNS {
        let excess = turns.len() - MAX_TURNS;
        turns.drain(..excess);
    }
}
