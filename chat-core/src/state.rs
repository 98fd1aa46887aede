//! Connection status machine for simple-chat.
//!
//! This module provides a pure, side-effect-free state machine for the
//! coarse connected/disconnected status. It takes transport lifecycle
//! events as input and produces a new status plus the notices that should
//! be surfaced to the application.
//!
//! The machine guarantees that `Connected` and `Disconnected` notices
//! strictly alternate, starting with `Connected`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse connection status - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Connected to the server.
    Connected,
    /// Not connected (initial state).
    Disconnected,
}

impl ConnectionStatus {
    /// Create a new state machine in the Disconnected state.
    pub fn new() -> Self {
        Self::Disconnected
    }

    /// Process a lifecycle event and return the new status plus notices to emit.
    ///
    /// This is a pure function - no side effects. The caller (chat-client)
    /// is responsible for delivering the returned notices.
    pub fn on_event(self, event: Lifecycle) -> (Self, Vec<StatusNotice>) {
        match (self, event) {
            (Self::Disconnected, Lifecycle::Connected) => {
                (Self::Connected, vec![StatusNotice::Connected])
            }
            // Duplicate connect, already reported
            (Self::Connected, Lifecycle::Connected) => (Self::Connected, vec![]),

            (Self::Connected, Lifecycle::Disconnected { reason }) => (
                Self::Disconnected,
                vec![StatusNotice::Disconnected { reason }],
            ),
            (Self::Disconnected, Lifecycle::Disconnected { .. }) => (Self::Disconnected, vec![]),

            (Self::Connected, Lifecycle::Failed(fault)) => {
                let reason = fault.message.clone();
                (
                    Self::Disconnected,
                    vec![
                        StatusNotice::Error(fault),
                        StatusNotice::Disconnected { reason },
                    ],
                )
            }
            (Self::Disconnected, Lifecycle::Failed(fault)) => {
                (Self::Disconnected, vec![StatusNotice::Error(fault)])
            }
        }
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected => f.write_str("connected"),
            Self::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// Transport lifecycle events that affect the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    /// Transport connected and authenticated.
    Connected,
    /// Transport connection was closed.
    Disconnected {
        /// Reason reported by the transport.
        reason: String,
    },
    /// Connection error or generic transport error.
    Failed(ConnectionFault),
}

/// Origin of a connection fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Connecting or authenticating failed.
    Connect,
    /// Generic transport error on an established connection.
    Transport,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Transport => f.write_str("transport"),
        }
    }
}

/// A connection-level error reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct ConnectionFault {
    /// Where the fault originated.
    pub kind: FaultKind,
    /// Description from the transport.
    pub message: String,
}

impl ConnectionFault {
    /// A fault raised while connecting.
    pub fn connect(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Connect,
            message: message.into(),
        }
    }

    /// A fault raised by an established transport.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Transport,
            message: message.into(),
        }
    }
}

/// Notices produced by the state machine for the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusNotice {
    /// Now connected.
    Connected,
    /// Now disconnected.
    Disconnected {
        /// Reason for disconnection.
        reason: String,
    },
    /// A connection fault occurred.
    Error(ConnectionFault),
}
