//! Types for conversation management.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Assistant text shown in place of an answer when the remote call fails.
pub const ERROR_MESSAGE: &str = "⚠️ ERROR";

/// Maximum number of characters kept when deriving a title from a message.
pub const TITLE_MAX_CHARS: usize = 20;

/// Conversation identifier: creation time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl ConversationId {
    /// Next identifier, strictly greater than `previous` even if the clock stalls.
    #[must_use]
    pub fn next_after(previous: Option<Self>) -> Self {
        let now_ms = chrono::Utc::now().timestamp_millis();
        match previous {
            Some(Self(prev)) if prev >= now_ms => Self(prev.saturating_add(1)),
            _ => Self(now_ms),
        }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// The person typing.
    #[serde(rename = "user")]
    User,
    /// The chat endpoint (or the local error notice).
    #[serde(rename = "bot")]
    Assistant,
}

/// One entry of a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Literal content.
    pub text: String,
    /// Author.
    pub sender: Sender,
}

impl Message {
    /// Message typed by the user.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    /// Message produced by the assistant.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
        }
    }

    /// Assistant notice used when the remote call fails.
    #[must_use]
    pub fn error_notice() -> Self {
        Self::assistant(ERROR_MESSAGE)
    }
}

/// One thread of messages ("flight").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier.
    pub id: ConversationId,
    /// Display title.
    pub title: String,
    /// Messages in chronological order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Title of the seeded conversation and of the replacement after deleting the last one.
    pub const DEFAULT_TITLE: &'static str = "Current Flight";
    /// Title of conversations opened explicitly.
    pub const NEW_TITLE: &'static str = "New Mission";

    /// Create a conversation holding only the welcome message.
    #[must_use]
    pub fn with_welcome(id: ConversationId, title: &str, language: Language) -> Self {
        Self {
            id,
            title: title.to_string(),
            messages: vec![Message::assistant(language.translations().welcome_msg)],
        }
    }

    /// Append a user message; the first one after the welcome names the conversation.
    ///
    /// Returns `true` when the title changed.
    pub fn push_user(&mut self, text: &str) -> bool {
        self.messages.push(Message::user(text));
        if self.messages.len() == 2 {
            self.title = truncate_title(text);
            return true;
        }
        false
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// First [`TITLE_MAX_CHARS`] characters of `text`.
#[must_use]
pub fn truncate_title(text: &str) -> String {
    text.chars().take(TITLE_MAX_CHARS).collect()
}

/// Read-only view of the store handed to observers after each change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// All conversations, newest first.
    pub conversations: Vec<Conversation>,
    /// Position of the active conversation.
    pub active_index: usize,
    /// Whether a remote call is outstanding.
    pub pending: bool,
    /// Current UI language.
    pub language: Language,
}

impl StoreSnapshot {
    /// The conversation currently shown.
    #[must_use]
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.conversations.get(self.active_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id_is_strictly_increasing() {
        let far_future = ConversationId(i64::MAX - 10);
        assert_eq!(
            ConversationId::next_after(Some(far_future)),
            ConversationId(i64::MAX - 9)
        );

        let first = ConversationId::next_after(None);
        let second = ConversationId::next_after(Some(first));
        assert!(second > first);
    }

    #[test]
    fn test_title_set_once_from_first_user_message() {
        let mut conversation =
            Conversation::with_welcome(ConversationId(1), Conversation::NEW_TITLE, Language::En);

        assert!(conversation.push_user("A very long destination name indeed"));
        assert_eq!(conversation.title, "A very long destinat");

        conversation.push_assistant(Message::assistant("ok"));
        assert!(!conversation.push_user("Tokyo"));
        assert_eq!(conversation.title, "A very long destinat");
    }

    #[test]
    fn test_title_truncation_counts_characters() {
        assert_eq!(truncate_title("✈️✈️✈️"), "✈️✈️✈️");
        assert_eq!(truncate_title(&"é".repeat(30)).chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn test_storage_layout() {
        let conversation = Conversation {
            id: ConversationId(1_700_000_000_000),
            title: "Tokyo".to_string(),
            messages: vec![Message::assistant("hi"), Message::user("Tokyo")],
        };

        let json = serde_json::to_value(&conversation).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1_700_000_000_000_i64,
                "title": "Tokyo",
                "messages": [
                    {"text": "hi", "sender": "bot"},
                    {"text": "Tokyo", "sender": "user"}
                ]
            })
        );
    }
}
