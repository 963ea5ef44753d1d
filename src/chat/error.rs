//! Error types for the chat client.

use thiserror::Error;

/// Errors that can occur while talking to the chat endpoint.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Endpoint answered with a non-success status.
    #[error("chat endpoint returned status {0}")]
    Status(u16),

    /// Response body is not the expected JSON.
    #[error("invalid response payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// No answer within the configured timeout.
    #[error("Request timed out")]
    Timeout,
}

/// Convenience result alias for chat calls.
pub type ChatResult<T> = Result<T, ChatError>;

