//! Conversation store: the list of flights, the active one, and the chat exchange.
//!
//! All state lives behind one async mutex. The only step that runs without the
//! lock is the remote call of [`ConversationStore::submit_message`]; the
//! `pending` flag is checked and raised under the lock, so two submissions can
//! never both reach the endpoint. Replies are routed back by conversation id,
//! not by position, since the user may switch or delete conversations while a
//! call is in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::chat::{ChatClient, ChatError, ChatRequest, ChatResponse};
use crate::config::WingmanConfig;
use crate::i18n::Language;

use super::error::{StoreError, StoreResult};
use super::storage::ConversationStorage;
use super::types::{Conversation, ConversationId, Message, StoreSnapshot};

/// Store settings independent of the backends.
#[derive(Clone, Copy, Debug)]
pub struct StoreOptions {
    /// Language at startup.
    pub language: Language,
    /// Upper bound for one remote call.
    pub request_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            language: Language::En,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&WingmanConfig> for StoreOptions {
    fn from(config: &WingmanConfig) -> Self {
        Self {
            language: config.language,
            request_timeout: config.request_timeout,
        }
    }
}

/// What happened to a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty text, or another submission was still pending.
    Ignored,
    /// The answer was appended.
    Answered,
    /// The call failed; the error notice was appended.
    Failed,
    /// The originating conversation was deleted before the reply arrived.
    Dropped,
}

struct StoreState {
    conversations: Vec<Conversation>,
    active_index: usize,
    pending: bool,
    session_token: Option<String>,
    // Bumped whenever the token is cleared, so a reply from an older session
    // cannot reinstall its token.
    session_epoch: u64,
    language: Language,
}

impl StoreState {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            conversations: self.conversations.clone(),
            active_index: self.active_index,
            pending: self.pending,
            language: self.language,
        }
    }

    fn next_id(&self) -> ConversationId {
        ConversationId::next_after(self.conversations.iter().map(|c| c.id).max())
    }

    fn reset_session(&mut self) {
        self.session_token = None;
        self.session_epoch += 1;
    }

    /// File the outcome of a remote call under the conversation it came from.
    fn settle(
        &mut self,
        origin: ConversationId,
        epoch: u64,
        result: Result<ChatResponse, ChatError>,
    ) -> SubmitOutcome {
        let (reply, outcome) = match result {
            Ok(response) => {
                if let Some(token) = response.session_id {
                    if self.session_epoch == epoch {
                        self.session_token = Some(token);
                    } else {
                        debug!("discarding session token from a superseded session");
                    }
                }
                (Message::assistant(response.answer), SubmitOutcome::Answered)
            }
            Err(err) => {
                warn!(error = %err, "chat request failed");
                (Message::error_notice(), SubmitOutcome::Failed)
            }
        };

        let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == origin) else {
            debug!(id = %origin, "conversation deleted before its reply arrived");
            return SubmitOutcome::Dropped;
        };
        conversation.push_assistant(reply);
        outcome
    }
}

/// Owner of the conversation list and of the remote chat exchange.
pub struct ConversationStore {
    storage: Box<dyn ConversationStorage>,
    client: Arc<dyn ChatClient>,
    request_timeout: Duration,
    state: Mutex<StoreState>,
    updates: watch::Sender<StoreSnapshot>,
}

impl ConversationStore {
    /// Load the persisted list, or seed one default conversation.
    ///
    /// Unreadable or malformed data is treated as absent.
    pub async fn initialize(
        storage: Box<dyn ConversationStorage>,
        client: Arc<dyn ChatClient>,
        options: StoreOptions,
    ) -> Self {
        let conversations = load_conversations(storage.as_ref()).await.unwrap_or_else(|| {
            info!("no saved conversations, starting a new flight");
            vec![Conversation::with_welcome(
                ConversationId::next_after(None),
                Conversation::DEFAULT_TITLE,
                options.language,
            )]
        });

        let state = StoreState {
            conversations,
            active_index: 0,
            pending: false,
            session_token: None,
            session_epoch: 0,
            language: options.language,
        };
        let (updates, _) = watch::channel(state.snapshot());

        Self {
            storage,
            client,
            request_timeout: options.request_timeout,
            state: Mutex::new(state),
            updates,
        }
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.updates.borrow().clone()
    }

    /// Receive a snapshot after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.updates.subscribe()
    }

    /// Prepend a fresh conversation and make it active.
    pub async fn new_conversation(&self) -> StoreSnapshot {
        let mut state = self.state.lock().await;

        let conversation =
            Conversation::with_welcome(state.next_id(), Conversation::NEW_TITLE, state.language);
        debug!(id = %conversation.id, "new conversation");
        state.conversations.insert(0, conversation);
        state.active_index = 0;
        state.reset_session();

        self.persist(&state).await;
        self.publish(&state)
    }

    /// Make the conversation at `index` active.
    ///
    /// # Errors
    /// Returns [`StoreError::IndexOutOfRange`] if `index` is not a valid position.
    pub async fn select_conversation(&self, index: usize) -> StoreResult<StoreSnapshot> {
        let mut state = self.state.lock().await;

        let len = state.conversations.len();
        if index >= len {
            return Err(StoreError::IndexOutOfRange { index, len });
        }

        state.active_index = index;
        state.reset_session();
        debug!(index, "selected conversation");

        Ok(self.publish(&state))
    }

    /// Remove the conversation with `id`; the list never becomes empty.
    ///
    /// # Errors
    /// Returns [`StoreError::ConversationNotFound`] if no conversation has this id.
    pub async fn delete_conversation(&self, id: ConversationId) -> StoreResult<StoreSnapshot> {
        let mut state = self.state.lock().await;

        let Some(position) = state.conversations.iter().position(|c| c.id == id) else {
            return Err(StoreError::ConversationNotFound(id));
        };

        if state.conversations.len() == 1 {
            let replacement = Conversation::with_welcome(
                state.next_id(),
                Conversation::DEFAULT_TITLE,
                state.language,
            );
            state.conversations = vec![replacement];
            state.active_index = 0;
            state.reset_session();
        } else {
            state.conversations.remove(position);
            if state.active_index == position {
                state.active_index = 0;
                state.reset_session();
            } else if state.active_index > position {
                state.active_index -= 1;
            }
        }
        debug!(%id, "deleted conversation");

        self.persist(&state).await;
        Ok(self.publish(&state))
    }

    /// Switch the language used for the endpoint and for new welcome messages.
    pub async fn set_language(&self, language: Language) -> StoreSnapshot {
        let mut state = self.state.lock().await;
        state.language = language;
        self.publish(&state)
    }

    /// Send `explicit_text`, or `text` when absent, to the chat endpoint.
    ///
    /// Blank text and submissions made while another one is pending are ignored.
    /// Remote failures are turned into an assistant error notice.
    pub async fn submit_message(&self, text: &str, explicit_text: Option<&str>) -> SubmitOutcome {
        let effective = explicit_text.unwrap_or(text);
        if effective.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        let (request, origin, epoch) = {
            let mut guard = self.state.lock().await;
            if guard.pending {
                debug!("submission ignored, a reply is pending");
                return SubmitOutcome::Ignored;
            }

            let state = &mut *guard;
            let Some(conversation) = state.conversations.get_mut(state.active_index) else {
                return SubmitOutcome::Ignored;
            };
            if conversation.push_user(effective) {
                debug!(id = %conversation.id, title = %conversation.title, "conversation named");
            }
            let origin = conversation.id;
            state.pending = true;

            self.persist(state).await;
            self.publish(state);

            let request =
                ChatRequest::new(effective, state.language, state.session_token.clone());
            (request, origin, state.session_epoch)
        };

        let result = tokio::time::timeout(self.request_timeout, self.client.send(request))
            .await
            .unwrap_or(Err(ChatError::Timeout));

        let mut state = self.state.lock().await;
        let outcome = state.settle(origin, epoch, result);
        self.persist(&state).await;
        state.pending = false;
        self.publish(&state);
        drop(state);
        outcome
    }

    async fn persist(&self, state: &StoreState) {
        let payload = match serde_json::to_string(&state.conversations) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to encode conversations");
                return;
            }
        };
        if let Err(err) = self.storage.save(payload).await {
            warn!(error = %err, "failed to save conversations");
        }
    }

    fn publish(&self, state: &StoreState) -> StoreSnapshot {
        let snapshot = state.snapshot();
        self.updates.send_replace(snapshot.clone());
        snapshot
    }
}

async fn load_conversations(storage: &dyn ConversationStorage) -> Option<Vec<Conversation>> {
    let payload = match storage.load().await {
        Ok(payload) => payload?,
        Err(err) => {
            warn!(error = %err, "failed to read saved conversations");
            return None;
        }
    };

    match serde_json::from_str::<Vec<Conversation>>(&payload) {
        Ok(conversations) if !conversations.is_empty() => {
            info!(count = conversations.len(), "loaded conversations");
            Some(conversations)
        }
        Ok(_) => None,
        Err(err) => {
            warn!(error = %err, "ignoring malformed saved conversations");
            None
        }
    }
}
