//! Durable key-value slot holding the serialized conversation list.
//!
//! Every backend stores one opaque string under one key. Writes replace the
//! whole value (last writer wins); reads of a missing slot yield `None`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use rusqlite::OptionalExtension;
use tokio::sync::Mutex;
use tokio_rusqlite::Connection;

use crate::config::StorageBackend;

use super::error::{StorageError, StorageResult};

/// Boxed future type for storage operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for the conversation slot.
pub trait ConversationStorage: Send + Sync {
    /// Read the slot.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn load(&self) -> StoreFuture<'_, StorageResult<Option<String>>>;

    /// Overwrite the slot.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn save(&self, payload: String) -> StoreFuture<'_, StorageResult<()>>;
}

/// Open the backend selected in the configuration.
///
/// # Errors
/// Returns an error if the `SQLite` database cannot be opened.
pub async fn open_storage(
    backend: &StorageBackend,
    key: &str,
) -> StorageResult<Box<dyn ConversationStorage>> {
    let storage: Box<dyn ConversationStorage> = match backend {
        StorageBackend::Memory => Box::new(MemoryStorage::new()),
        StorageBackend::JsonFile(path) => Box::new(JsonFileStorage::new(path.clone())),
        StorageBackend::Sqlite(path) => Box::new(SqliteStorage::open(path, key).await?),
    };
    Ok(storage)
}

/// In-process slot; clones share the same value.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    /// Empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with `payload`.
    #[must_use]
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(payload.into()))),
        }
    }

    /// Current raw value.
    pub async fn payload(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }
}

impl ConversationStorage for MemoryStorage {
    fn load(&self) -> StoreFuture<'_, StorageResult<Option<String>>> {
        Box::pin(async move { Ok(self.slot.lock().await.clone()) })
    }

    fn save(&self, payload: String) -> StoreFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            *self.slot.lock().await = Some(payload);
            Ok(())
        })
    }
}

/// Slot backed by one JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Use the file at `path`; it is created on first save.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ConversationStorage for JsonFileStorage {
    fn load(&self) -> StoreFuture<'_, StorageResult<Option<String>>> {
        Box::pin(async move {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(payload) => Ok(Some(payload)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(StorageError::Io(err)),
            }
        })
    }

    fn save(&self, payload: String) -> StoreFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }

            // Write aside then rename so a crash never leaves half a list behind.
            let temp = self.temp_path();
            tokio::fs::write(&temp, payload).await?;
            tokio::fs::rename(&temp, &self.path).await?;
            Ok(())
        })
    }
}

/// Slot stored as one row of a `SQLite` key-value table.
pub struct SqliteStorage {
    conn: Arc<Connection>,
    table: String,
    key: String,
}

impl SqliteStorage {
    /// Table name for slots.
    pub const DEFAULT_TABLE: &'static str = "kv_slots";

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn open(path: &Path, key: &str) -> StorageResult<Self> {
        let conn = Connection::open(path).await?;
        Self::new(Arc::new(conn), key).await
    }

    /// Use an already opened connection and create the table if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>, key: &str) -> StorageResult<Self> {
        let table = Self::DEFAULT_TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            table,
            key: key.to_string(),
        })
    }
}

impl ConversationStorage for SqliteStorage {
    fn load(&self) -> StoreFuture<'_, StorageResult<Option<String>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let key = self.key.clone();
            let value = self
                .conn
                .call(move |conn| {
                    let value = conn
                        .query_row(
                            &format!("SELECT value FROM {table} WHERE key = ?1"),
                            rusqlite::params![key],
                            |row| row.get::<_, String>(0),
                        )
                        .optional()?;
                    Ok(value)
                })
                .await?;
            Ok(value)
        })
    }

    fn save(&self, payload: String) -> StoreFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            let key = self.key.clone();
            let now_ms = chrono::Utc::now().timestamp_millis();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT OR REPLACE INTO {table} (key, value, updated_at)
                             VALUES (?1, ?2, ?3)"
                        ),
                        rusqlite::params![key, payload, now_ms],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }
}
