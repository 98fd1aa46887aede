//! Transport abstraction for simple-chat.
//!
//! This module provides a pluggable transport layer that owns the actual
//! connection: framing, authentication, request/acknowledgement correlation
//! and reconnection all live behind the [`Transport`] trait.
//!
//! # Design
//!
//! The transport trait is async and event-driven:
//! - `connect()` starts a connection attempt and hands back the event stream
//! - `emit_with_ack()` sends a named request and returns the pending acknowledgement
//! - `close()` gracefully terminates
//!
//! Lifecycle changes, reconnection progress and server pushes all arrive as
//! [`TransportEvent`]s on the stream returned by `connect()`.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! let mut events = transport.connect(options).await?;
//! let ack = transport.emit_with_ack("join_chat", vec![json!("chat-1"), json!(false)]).await?;
//! let reply = ack.await?;
//! ```

mod mock;
mod websocket;

pub use mock::{EmittedRequest, MockTransport};
pub use websocket::{WebSocketTransport, WebSocketTransportConfig};

use async_trait::async_trait;
use chat_types::{Auth, ProtocolError};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// `connect()` has not been called.
    #[error("not connected")]
    NotConnected,

    /// The transport was closed or its connection task has ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Parameters for opening a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Server address, `host:port`.
    pub url: String,
    /// Credentials sent during the handshake.
    pub auth: Auth,
    /// Reconnection attempts after an unexpected loss (`None` = unlimited).
    pub reconnection_attempts: Option<u32>,
}

/// Callback answering a server event that asked for an acknowledgement.
pub struct AckHandle {
    respond: Box<dyn FnOnce(Vec<Value>) + Send>,
}

impl AckHandle {
    /// Wrap a callback that delivers the acknowledgement arguments.
    pub fn new(respond: impl FnOnce(Vec<Value>) + Send + 'static) -> Self {
        Self {
            respond: Box::new(respond),
        }
    }

    /// Send the acknowledgement. Consumes the handle.
    pub fn send(self, args: Vec<Value>) {
        (self.respond)(args)
    }
}

impl std::fmt::Debug for AckHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AckHandle")
    }
}

/// Events produced by a transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// Connected and authenticated.
    Connect,
    /// Connection closed.
    Disconnect {
        /// Why the connection closed.
        reason: String,
    },
    /// Connecting or authenticating failed.
    ConnectError(String),
    /// Generic transport error.
    Error(String),
    /// Reconnected after the given number of attempts.
    Reconnect(u32),
    /// About to make reconnection attempt `n`.
    ReconnectAttempt(u32),
    /// A reconnection attempt failed.
    ReconnectError(String),
    /// All reconnection attempts were used up.
    ReconnectFailed,
    /// Named event pushed by the server.
    Event {
        /// Event name.
        event: String,
        /// Positional arguments.
        args: Vec<Value>,
        /// Present when the server expects an acknowledgement.
        ack: Option<AckHandle>,
    },
}

/// Stream of transport events returned by [`Transport::connect`].
pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;

/// Pending acknowledgement returned by [`Transport::emit_with_ack`].
pub type AckReceiver = oneshot::Receiver<Vec<Value>>;

/// Transport trait for exchanging chat events with the server.
///
/// Implementations handle the underlying connection mechanism
/// (WebSocket, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start connecting and return the event stream.
    ///
    /// Returns as soon as the attempt is under way; success or failure is
    /// reported through [`TransportEvent::Connect`] or
    /// [`TransportEvent::ConnectError`].
    async fn connect(&self, options: ConnectOptions) -> Result<TransportEvents, TransportError>;

    /// Send a named event and return the receiver for its acknowledgement.
    ///
    /// Events emitted while the connection is down may be queued by the
    /// transport. The receiver fails if the transport drops the request.
    async fn emit_with_ack(
        &self,
        event: &str,
        args: Vec<Value>,
    ) -> Result<AckReceiver, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    ///
    /// After closing, the transport emits its final
    /// [`TransportEvent::Disconnect`] (if it was connected) and ends the
    /// event stream.
    async fn close(&self) -> Result<(), TransportError>;
}
