//! Conversation management module.
//!
//! This module owns the list of conversations, the storage slot they are
//! persisted in, and the exchange with the chat endpoint.

pub mod error;
pub mod storage;
pub mod store;
pub mod types;

pub use error::{StorageError, StorageResult, StoreError, StoreResult};
pub use storage::{
    ConversationStorage, JsonFileStorage, MemoryStorage, SqliteStorage, open_storage,
};
pub use store::{ConversationStore, StoreOptions, SubmitOutcome};
pub use types::{Conversation, ConversationId, ERROR_MESSAGE, Message, Sender, StoreSnapshot};
