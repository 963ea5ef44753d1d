//! HTTP implementation of the chat collaborator.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::config::WingmanConfig;

use super::error::{ChatError, ChatResult};
use super::types::{ChatRequest, ChatResponse};

/// Boxed future type for chat calls.
pub type ChatFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything able to answer a chat message.
pub trait ChatClient: Send + Sync {
    /// Send one message and wait for the answer.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status or malformed body.
    fn send(&self, request: ChatRequest) -> ChatFuture<'_, ChatResult<ChatResponse>>;
}

/// Chat client talking JSON over HTTP.
pub struct HttpChatClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChatClient {
    /// Create a client for the endpoint and timeouts in `config`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &WingmanConfig) -> ChatResult<Self> {
        let client = Self::build_client(config)?;
        Ok(Self {
            client,
            endpoint: config.chat_url.clone(),
        })
    }

    fn build_client(config: &WingmanConfig) -> ChatResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ChatError::HttpClient(e.to_string()))
    }

    async fn post(&self, request: ChatRequest) -> ChatResult<ChatResponse> {
        tracing::debug!(
            endpoint = %self.endpoint,
            has_session = request.session_id.is_some(),
            "sending chat message"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else {
                    ChatError::HttpRequest(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let answer: ChatResponse = serde_json::from_str(&body)?;
        Ok(answer)
    }
}

impl ChatClient for HttpChatClient {
    fn send(&self, request: ChatRequest) -> ChatFuture<'_, ChatResult<ChatResponse>> {
        Box::pin(self.post(request))
    }
}
