//! Notifications delivered to the application.

use chat_core::ConnectionFault;
use chat_types::Message;
use tokio::sync::mpsc;

use crate::transport::AckHandle;

/// Receiver for [`ChatEvent`]s, handed out by `ChatClient::take_events`.
pub type ChatEvents = mpsc::UnboundedReceiver<ChatEvent>;

/// A notification from the chat client.
#[derive(Debug)]
pub enum ChatEvent {
    /// Connected to the server.
    Connected,
    /// Disconnected from the server.
    Disconnected {
        /// Reason reported by the transport.
        reason: String,
    },
    /// Connection error or generic transport error.
    Error(ConnectionFault),
    /// Reconnected after `attempt` attempts.
    Reconnect {
        /// Attempt that succeeded.
        attempt: u32,
    },
    /// About to make a reconnection attempt.
    ReconnectAttempt {
        /// Attempt number, starting at 1.
        attempt: u32,
    },
    /// A reconnection attempt failed.
    ReconnectError {
        /// Failure description.
        error: String,
    },
    /// The transport gave up reconnecting.
    ReconnectFailed,
    /// A message pushed by the server.
    ///
    /// Call [`MessageAck::ack`] once the message is handled; otherwise the
    /// server treats it as undelivered.
    Message {
        /// The message.
        message: Message,
        /// Acknowledgement for the server.
        ack: MessageAck,
    },
}

/// Acknowledgement owed to the server for a pushed message.
pub struct MessageAck {
    handle: Option<AckHandle>,
    message_id: Option<String>,
}

impl MessageAck {
    pub(crate) fn new(handle: Option<AckHandle>, message_id: Option<String>) -> Self {
        Self { handle, message_id }
    }

    /// Whether the server asked for an acknowledgement.
    pub fn is_required(&self) -> bool {
        self.handle.is_some()
    }

    /// Acknowledge receipt. Consumes the acknowledgement.
    pub fn ack(mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::debug!(message_id = ?self.message_id, "acknowledging pushed message");
            handle.send(Vec::new());
        }
    }
}

impl Drop for MessageAck {
    fn drop(&mut self) {
        if self.handle.is_some() {
            tracing::debug!(
                message_id = ?self.message_id,
                "pushed message dropped without acknowledgement"
            );
        }
    }
}

impl std::fmt::Debug for MessageAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageAck")
            .field("message_id", &self.message_id)
            .field("required", &self.is_required())
            .finish()
    }
}
