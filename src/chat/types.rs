//! Wire types of the chat endpoint.

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Body of one chat call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Language the answer should be written in.
    pub language: Language,
    /// Correlation token from the previous answer, `null` on a fresh session.
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Build a request.
    #[must_use]
    pub fn new(message: impl Into<String>, language: Language, session_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            language,
            session_id,
        }
    }
}

/// Successful answer of the chat endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's answer.
    pub answer: String,
    /// Token to send back with the next message of the same conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}
