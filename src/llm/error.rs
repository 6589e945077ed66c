//! Error types for model clients.

use thiserror::Error;

/// Errors produced while calling a conversational model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (connect, timeout, body decode).
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// The endpoint answered with a non-success status.
    #[error("model API returned status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        message: String,
    },
    /// The completion carried no choices.
    #[error("model returned no choices")]
    EmptyResponse,
    /// Client construction failed.
    #[error("client configuration error: {0}")]
    Client(String),
}

/// Convenience result alias for model calls.
pub type LlmResult<T> = Result<T, LlmError>;
