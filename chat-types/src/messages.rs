//! Chat payloads exchanged with the server.
//!
//! Field names match the server's JSON exactly; optional fields are
//! omitted when absent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Free-form message body.
pub type MessageBody = serde_json::Map<String, serde_json::Value>;

/// A chat message.
///
/// Used both for outgoing messages (where `id` and `from` are normally
/// left empty and filled in by the server) and for messages pushed by the
/// server or returned from the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Destination chat or user id
    pub to: String,
    /// Unix timestamp supplied by the sender
    pub timestamp: u64,
    /// Message content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<MessageBody>,
    /// Typing indicator, may be sent with or without a body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typing: Option<bool>,
    /// Sender id (set by the server)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl Message {
    /// Create a message addressed to `to` with no body.
    pub fn new(to: impl Into<String>, timestamp: u64) -> Self {
        Self {
            id: None,
            to: to.into(),
            timestamp,
            body: None,
            typing: None,
            from: None,
        }
    }

    /// Create a text message with body `{"text": text}`.
    pub fn text(to: impl Into<String>, timestamp: u64, text: impl Into<String>) -> Self {
        let mut body = MessageBody::new();
        body.insert("text".into(), serde_json::Value::String(text.into()));
        Self::new(to, timestamp).with_body(body)
    }

    /// Set the message body.
    pub fn with_body(mut self, body: MessageBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the typing flag.
    pub fn with_typing(mut self, typing: bool) -> Self {
        self.typing = Some(typing);
        self
    }

    /// The `text` field of the body, if any.
    pub fn text_body(&self) -> Option<&str> {
        self.body.as_ref()?.get("text")?.as_str()
    }
}

/// Kind of chat to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatType {
    /// Single-user chat (exactly two participants)
    #[serde(rename = "@suc")]
    Suc,
    /// Multi-user chat
    #[serde(rename = "@muc")]
    Muc,
}

impl ChatType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Suc => "@suc",
            ChatType::Muc => "@muc",
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error returned by the server in an acknowledgement.
///
/// Surfaced to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{error} (code {code})")]
pub struct AppError {
    /// Error code
    pub code: i64,
    /// Error message
    #[serde(alias = "message")]
    pub error: String,
}

impl AppError {
    /// Create an application error.
    pub fn new(code: i64, error: impl Into<String>) -> Self {
        Self {
            code,
            error: error.into(),
        }
    }
}

/// A request rejected locally before reaching the server.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid {field}: {error}")]
pub struct ValidationError {
    /// Offending argument
    pub field: String,
    /// Human-readable reason
    pub error: String,
}
