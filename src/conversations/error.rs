//! Error types for conversation storage and store operations.

use thiserror::Error;

use super::types::ConversationId;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File access failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// `SQLite` storage error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Caller errors on store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Selection outside the conversation list.
    #[error("conversation index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Current list length.
        len: usize,
    },
    /// No conversation carries this id.
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
