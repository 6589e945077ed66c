//! HTTP-facing error type.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::conversation::StoreError;
use crate::llm::LlmError;
use crate::recovery::RecoveryError;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or the body is malformed (400).
    #[error("{0}")]
    BadRequest(String),
    /// The session does not exist (404).
    #[error("Session not found")]
    NotFound,
    /// The model call failed (500).
    #[error("LLM error")]
    Upstream(#[from] LlmError),
    /// No recovery strategy could parse the mind map (500).
    #[error("Failed to parse mind map JSON: {0}")]
    MindMap(#[from] RecoveryError),
    /// The conversation store failed (500).
    #[error("Storage error")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::MindMap(_) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Upstream(err) => {
                tracing::error!("Model call failed: {err}");
                json!({ "error": self.to_string(), "details": err.to_string() })
            }
            Self::Store(err) => {
                tracing::error!("Store operation failed: {err}");
                json!({ "error": self.to_string(), "details": err.to_string() })
            }
            Self::MindMap(err) => {
                tracing::error!("Mind map recovery failed: {err}");
                json!({ "error": self.to_string() })
            }
            Self::BadRequest(_) | Self::NotFound => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
