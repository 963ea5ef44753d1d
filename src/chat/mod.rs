//! Client side of the external chat endpoint.
//!
//! The endpoint is a plain request/response JSON API:
//! - `POST {message, language, session_id}`
//! - `200 {answer, session_id?}`
//!
//! Anything else (transport error, non-2xx status, unreadable body) is a
//! [`ChatError`].

pub mod client;
pub mod error;
pub mod types;

pub use client::{ChatClient, ChatFuture, HttpChatClient};
pub use error::{ChatError, ChatResult};
pub use types::{ChatRequest, ChatResponse};
