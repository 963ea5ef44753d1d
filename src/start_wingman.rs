//! Startup helpers for the Wingman terminal client.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use crate::chat::HttpChatClient;
use crate::config::WingmanConfig;
use crate::conversations::{ConversationStore, StoreOptions, open_storage};
use crate::terminal;

/// Run the client (used by the `wingman` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` when the user leaves, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Wingman v{}", env!("CARGO_PKG_VERSION"));

    let config = match WingmanConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(run_with_config(&config)) {
        tracing::error!("Wingman stopped: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Build the store from `config` and hand it to the terminal loop.
///
/// # Errors
/// Returns an error if the storage or HTTP client cannot be created, or the
/// terminal fails.
pub async fn run_with_config(config: &WingmanConfig) -> anyhow::Result<()> {
    let store = initialize(config).await?;
    terminal::run(&store).await
}

/// Create the conversation store described by `config`.
///
/// # Errors
/// Returns an error if the storage backend or the HTTP client cannot be created.
pub async fn initialize(config: &WingmanConfig) -> anyhow::Result<Arc<ConversationStore>> {
    tracing::info!("Chat endpoint: {}", config.chat_url);
    tracing::debug!(storage = ?config.storage, "opening storage");

    let storage = open_storage(&config.storage, &config.storage_key)
        .await
        .context("failed to open conversation storage")?;
    let client = HttpChatClient::new(config).context("failed to create chat client")?;

    let store =
        ConversationStore::initialize(storage, Arc::new(client), StoreOptions::from(config)).await;
    Ok(Arc::new(store))
}
