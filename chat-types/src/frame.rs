//! Frame - the wire format for the WebSocket transport.
//!
//! Every WebSocket text message carries exactly one JSON frame, tagged by
//! its `type` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::ProtocolError;

/// Credentials sent with the first frame of a connection.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    /// Connecting user
    pub user_id: String,
    /// Access token
    pub token: String,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Request channels understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Send a chat message (also used for server pushes)
    Message,
    /// Load the message archive of a chat
    LoadArchive,
    /// Join a chat
    JoinChat,
    /// Leave a chat
    LeaveChat,
    /// Create a chat
    CreateChat,
}

impl Channel {
    /// Event name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Message => "message",
            Channel::LoadArchive => "load_archive",
            Channel::JoinChat => "join_chat",
            Channel::LeaveChat => "leave_chat",
            Channel::CreateChat => "create_chat",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(Channel::Message),
            "load_archive" => Ok(Channel::LoadArchive),
            "join_chat" => Ok(Channel::JoinChat),
            "leave_chat" => Ok(Channel::LeaveChat),
            "create_chat" => Ok(Channel::CreateChat),
            other => Err(ProtocolError::UnknownChannel(other.to_string())),
        }
    }
}

/// A single frame on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Client handshake, always the first frame of a connection
    Connect {
        /// Credentials
        auth: Auth,
    },
    /// Server accepted the handshake
    ConnectOk,
    /// Server rejected the handshake
    ConnectError {
        /// Rejection reason
        message: String,
    },
    /// Named event with positional arguments
    ///
    /// When `id` is set the receiver must answer with an [`Frame::Ack`]
    /// carrying the same id.
    Event {
        /// Event name
        event: String,
        /// Positional arguments
        #[serde(default)]
        args: Vec<Value>,
        /// Acknowledgement id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
    },
    /// Acknowledgement of an event
    Ack {
        /// Id of the acknowledged event
        id: u64,
        /// Positional acknowledgement arguments
        #[serde(default)]
        args: Vec<Value>,
    },
    /// Graceful disconnect
    Disconnect {
        /// Optional reason
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl Frame {
    /// Build an event frame.
    pub fn event(event: impl Into<String>, args: Vec<Value>, id: Option<u64>) -> Self {
        Frame::Event {
            event: event.into(),
            args,
            id,
        }
    }

    /// Serialize to a JSON text frame.
    pub fn to_text(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Serialization)
    }

    /// Deserialize from a JSON text frame.
    pub fn from_text(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Deserialization)
    }
}
