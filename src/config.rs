//! Runtime configuration for the Wingman client.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::i18n::Language;

/// Default chat endpoint.
pub const DEFAULT_CHAT_URL: &str = "http://localhost:8000/chat";
/// Name of the durable slot holding the conversation list.
pub const DEFAULT_STORAGE_KEY: &str = "wingman_chats";

const ENV_CHAT_URL: &str = "WINGMAN_CHAT_URL";
const ENV_LANG: &str = "WINGMAN_LANG";
const ENV_STORAGE: &str = "WINGMAN_STORAGE";
const ENV_DATA_PATH: &str = "WINGMAN_DATA_PATH";
const ENV_TIMEOUT: &str = "WINGMAN_TIMEOUT_SECS";
const ENV_CONNECT_TIMEOUT: &str = "WINGMAN_CONNECT_TIMEOUT_SECS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be used.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },
    /// The chat endpoint is not a valid URL.
    #[error("invalid chat url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Language code is not one of the supported ones.
    #[error("unsupported language: {0:?}")]
    UnsupportedLanguage(String),
}

/// Convenience result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which backend holds the conversation slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum StorageBackend {
    /// Nothing survives the process.
    Memory,
    /// A single JSON file.
    JsonFile(PathBuf),
    /// A key-value table in a `SQLite` database.
    Sqlite(PathBuf),
}

impl StorageBackend {
    fn parse(kind: &str, path: Option<String>) -> ConfigResult<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "json" => Ok(Self::JsonFile(
                path.map_or_else(|| PathBuf::from("wingman_chats.json"), PathBuf::from),
            )),
            "sqlite" => Ok(Self::Sqlite(
                path.map_or_else(|| PathBuf::from("wingman.sqlite"), PathBuf::from),
            )),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_STORAGE,
                value: kind.to_string(),
            }),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WingmanConfig {
    /// Chat endpoint receiving `POST` requests.
    pub chat_url: String,
    /// Language used at startup.
    pub language: Language,
    /// Where conversations are persisted.
    pub storage: StorageBackend,
    /// Slot name inside the backend.
    pub storage_key: String,
    /// Upper bound for one remote call.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Upper bound for establishing the connection.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for WingmanConfig {
    fn default() -> Self {
        Self {
            chat_url: DEFAULT_CHAT_URL.to_string(),
            language: Language::En,
            storage: StorageBackend::JsonFile(PathBuf::from("wingman_chats.json")),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl WingmanConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chat endpoint.
    #[must_use]
    pub fn with_chat_url(mut self, url: impl Into<String>) -> Self {
        self.chat_url = url.into();
        self
    }

    /// Set the startup language.
    #[must_use]
    pub const fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the storage backend.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    /// Set the remote call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load from `WINGMAN_*` environment variables, falling back to defaults.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns an error if a value is set but unusable.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_CHAT_URL) {
            config.chat_url = url;
        }
        if let Some(lang) = lookup(ENV_LANG) {
            config.language = lang.parse()?;
        }
        let data_path = lookup(ENV_DATA_PATH);
        if let Some(kind) = lookup(ENV_STORAGE) {
            config.storage = StorageBackend::parse(&kind, data_path)?;
        } else if let Some(path) = data_path {
            config.storage = StorageBackend::JsonFile(PathBuf::from(path));
        }
        if let Some(secs) = lookup(ENV_TIMEOUT) {
            config.request_timeout = parse_secs(ENV_TIMEOUT, &secs)?;
        }
        if let Some(secs) = lookup(ENV_CONNECT_TIMEOUT) {
            config.connect_timeout = parse_secs(ENV_CONNECT_TIMEOUT, &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or a timeout is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        Url::parse(&self.chat_url)?;

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: ENV_TIMEOUT,
                value: "0".to_string(),
            });
        }

        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "storage_key",
                value: self.storage_key.clone(),
            });
        }

        Ok(())
    }
}

fn parse_secs(key: &'static str, raw: &str) -> ConfigResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        })
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = WingmanConfig::default();
        assert_eq!(config.chat_url, DEFAULT_CHAT_URL);
        assert_eq!(config.storage_key, "wingman_chats");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = WingmanConfig::new()
            .with_chat_url("http://example.test/chat")
            .with_language(Language::Fr)
            .with_storage(StorageBackend::Memory)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.chat_url, "http://example.test/chat");
        assert_eq!(config.language, Language::Fr);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = WingmanConfig::from_lookup(lookup_from(&[
            ("WINGMAN_LANG", "fr"),
            ("WINGMAN_STORAGE", "sqlite"),
            ("WINGMAN_DATA_PATH", "/tmp/w.sqlite"),
            ("WINGMAN_TIMEOUT_SECS", "12"),
        ]));

        let config = config.unwrap_or_default();
        assert_eq!(config.language, Language::Fr);
        assert_eq!(
            config.storage,
            StorageBackend::Sqlite(PathBuf::from("/tmp/w.sqlite"))
        );
        assert_eq!(config.request_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(WingmanConfig::from_lookup(lookup_from(&[("WINGMAN_TIMEOUT_SECS", "soon")])).is_err());
        assert!(WingmanConfig::from_lookup(lookup_from(&[("WINGMAN_TIMEOUT_SECS", "0")])).is_err());
        assert!(WingmanConfig::from_lookup(lookup_from(&[("WINGMAN_STORAGE", "redis")])).is_err());
        assert!(WingmanConfig::from_lookup(lookup_from(&[("WINGMAN_CHAT_URL", "not a url")])).is_err());
        assert!(matches!(
            WingmanConfig::from_lookup(lookup_from(&[("WINGMAN_LANG", "de")])),
            Err(ConfigError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_data_path_without_backend_means_json() {
        let config =
            WingmanConfig::from_lookup(lookup_from(&[("WINGMAN_DATA_PATH", "chats.json")]))
                .unwrap_or_default();
        assert_eq!(
            config.storage,
            StorageBackend::JsonFile(PathBuf::from("chats.json"))
        );
    }
}
