//! ChatClient - the main interface for simple-chat.
//!
//! This module provides [`ChatClient`], the primary API for applications
//! to talk to a chat server.
//!
//! # Architecture
//!
//! ChatClient feeds transport lifecycle events through a pure status
//! machine (from chat-core) and turns typed calls into request/ack
//! round-trips via the Transport trait.
//!
//! ```text
//! Application → ChatClient → Transport → Network
//!       ↑            ↓
//!  ChatEvents   chat-core (status machine, ack decoding, validation)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use chat_client::{ChatClient, ChatConfig, ChatEvent, Message, WebSocketTransport};
//!
//! let config = ChatConfig::new("ws://localhost", 3000, "alice", "token");
//! let client = ChatClient::new(config, WebSocketTransport::new());
//! let mut events = client.take_events().await.expect("first call");
//!
//! client.start().await?;
//! while let Some(event) = events.recv().await {
//!     if let ChatEvent::Connected = event {
//!         let id = client.send_message(&Message::text("bob", 1700000000, "hi")).await?;
//!     }
//! }
//! ```

use chat_core::{
    decode_ack, validate_create_chat, AckOutcome, ConnectionFault, ConnectionStatus, Lifecycle,
    StatusNotice,
};
use chat_types::{AppError, Channel, ChatType, Message, ValidationError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::event::{ChatEvent, ChatEvents, MessageAck};
use crate::transport::{AckHandle, Transport, TransportError, TransportEvent, TransportEvents};

/// Client errors.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server rejected the request.
    #[error("server error: {0}")]
    App(#[from] AppError),

    /// The request failed local validation and was not sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The acknowledgement could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// `start()` has not been called.
    #[error("client not started")]
    NotStarted,

    /// `start()` was called on a running client.
    #[error("client already started")]
    AlreadyStarted,

    /// The acknowledgement carried neither a result nor an error.
    #[error("empty acknowledgement on {channel}")]
    EmptyAcknowledgement {
        /// Request channel.
        channel: Channel,
    },

    /// The transport dropped the request before it was acknowledged.
    #[error("acknowledgement dropped on {channel}")]
    AcknowledgementDropped {
        /// Request channel.
        channel: Channel,
    },
}

/// The main chat client.
///
/// Manages the connection lifecycle, status tracking and request/ack
/// round-trips over a single transport connection.
pub struct ChatClient<T: Transport> {
    config: ChatConfig,
    transport: T,
    status: Arc<Mutex<ConnectionStatus>>,
    events_tx: mpsc::UnboundedSender<ChatEvent>,
    events_rx: Mutex<Option<ChatEvents>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> ChatClient<T> {
    /// Create a new ChatClient. Nothing is connected until [`start`](Self::start).
    pub fn new(config: ChatConfig, transport: T) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            config,
            transport,
            status: Arc::new(Mutex::new(ConnectionStatus::new())),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            dispatcher: Mutex::new(None),
        }
    }

    /// Take the notification receiver.
    ///
    /// Returns `None` after the first call.
    pub async fn take_events(&self) -> Option<ChatEvents> {
        self.events_rx.lock().await.take()
    }

    /// Open the connection and start dispatching transport events.
    ///
    /// Returns once the connection attempt is pending; watch for
    /// [`ChatEvent::Connected`] or [`ChatEvent::Error`].
    pub async fn start(&self) -> Result<(), ChatError> {
        let mut dispatcher = self.dispatcher.lock().await;
        // A dispatcher whose stream ended on its own (server disconnect,
        // rejected handshake, reconnects exhausted) no longer blocks a restart
        if dispatcher.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(ChatError::AlreadyStarted);
        }

        let options = self.config.connect_options();
        info!(
            url = %options.url,
            user_id = %options.auth.user_id,
            "starting chat connection"
        );
        let events = self.transport.connect(options).await?;

        *dispatcher = Some(tokio::spawn(dispatch(
            events,
            Arc::clone(&self.status),
            self.events_tx.clone(),
        )));
        Ok(())
    }

    /// Close the connection.
    ///
    /// No-op if the client was never started or is already disconnected.
    /// Returns after the final lifecycle notification has been dispatched.
    pub async fn disconnect(&self) -> Result<(), ChatError> {
        let mut dispatcher = self.dispatcher.lock().await;
        if dispatcher.is_none() {
            return Ok(());
        }

        info!("disconnecting");
        // On failure the dispatcher stays registered and the client usable
        self.transport.close().await?;
        let Some(handle) = dispatcher.take() else {
            return Ok(());
        };
        drop(dispatcher);
        if let Err(e) = handle.await {
            warn!("event dispatcher ended abnormally: {}", e);
        }
        Ok(())
    }

    /// Current connection status.
    pub async fn status(&self) -> ConnectionStatus {
        *self.status.lock().await
    }

    /// Check if connected.
    pub async fn is_connected(&self) -> bool {
        self.status().await.is_connected()
    }

    /// Send a message and return the server-assigned message id.
    ///
    /// A message may carry a body, a typing flag, or both.
    pub async fn send_message(&self, message: &Message) -> Result<String, ChatError> {
        let payload =
            serde_json::to_value(message).map_err(|e| ChatError::Serialization(e.to_string()))?;
        self.request(Channel::Message, vec![payload]).await
    }

    /// Load up to `limit` archived messages of a chat.
    ///
    /// Without `after` the most recent messages are returned; with `after`
    /// the messages following that message id.
    pub async fn load_archive(
        &self,
        chat_id: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Vec<Message>, ChatError> {
        let after = after.map_or(Value::Null, |id| Value::String(id.to_string()));
        self.request(
            Channel::LoadArchive,
            vec![Value::from(chat_id), Value::from(limit), after],
        )
        .await
    }

    /// Join a chat.
    ///
    /// A temporary join is dropped by the server when this connection
    /// closes; a permanent one survives reconnects.
    pub async fn join_chat(&self, chat_id: &str, temporary: bool) -> Result<bool, ChatError> {
        self.request(
            Channel::JoinChat,
            vec![Value::from(chat_id), Value::Bool(temporary)],
        )
        .await
    }

    /// Leave a chat. No further messages from it are delivered.
    pub async fn leave_chat(&self, chat_id: &str) -> Result<bool, ChatError> {
        self.request(Channel::LeaveChat, vec![Value::from(chat_id)])
            .await
    }

    /// Create a chat and return its id.
    ///
    /// Fails without contacting the server if more than two participant
    /// ids are given.
    pub async fn create_chat(
        &self,
        chat_type: ChatType,
        participants: &[String],
    ) -> Result<String, ChatError> {
        validate_create_chat(chat_type, participants)?;
        self.request(
            Channel::CreateChat,
            vec![Value::from(chat_type.as_str()), Value::from(participants.to_vec())],
        )
        .await
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn request<R: DeserializeOwned>(
        &self,
        channel: Channel,
        args: Vec<Value>,
    ) -> Result<R, ChatError> {
        if self.dispatcher.lock().await.is_none() {
            return Err(ChatError::NotStarted);
        }

        debug!(%channel, "sending request");
        let reply = self.transport.emit_with_ack(channel.as_str(), args).await?;
        let args = reply
            .await
            .map_err(|_| ChatError::AcknowledgementDropped { channel })?;

        match decode_ack(args) {
            AckOutcome::Resolved(value) => Ok(value),
            AckOutcome::Rejected(err) => {
                debug!(%channel, code = err.code, "request rejected: {}", err.error);
                Err(ChatError::App(err))
            }
            AckOutcome::Empty => Err(ChatError::EmptyAcknowledgement { channel }),
            AckOutcome::Malformed(reason) => Err(ChatError::Protocol(reason)),
        }
    }
}

/// Drive transport events until the stream ends.
///
/// The only writer of `status`.
async fn dispatch(
    mut events: TransportEvents,
    status: Arc<Mutex<ConnectionStatus>>,
    out: mpsc::UnboundedSender<ChatEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Connect => apply(&status, &out, Lifecycle::Connected).await,
            TransportEvent::Disconnect { reason } => {
                apply(&status, &out, Lifecycle::Disconnected { reason }).await
            }
            TransportEvent::ConnectError(error) => {
                apply(
                    &status,
                    &out,
                    Lifecycle::Failed(ConnectionFault::connect(error)),
                )
                .await
            }
            TransportEvent::Error(error) => {
                apply(
                    &status,
                    &out,
                    Lifecycle::Failed(ConnectionFault::transport(error)),
                )
                .await
            }
            TransportEvent::Reconnect(attempt) => {
                info!(attempt, "reconnected");
                let _ = out.send(ChatEvent::Reconnect { attempt });
            }
            TransportEvent::ReconnectAttempt(attempt) => {
                debug!(attempt, "reconnect attempt");
                let _ = out.send(ChatEvent::ReconnectAttempt { attempt });
            }
            TransportEvent::ReconnectError(error) => {
                debug!("reconnect error: {}", error);
                let _ = out.send(ChatEvent::ReconnectError { error });
            }
            TransportEvent::ReconnectFailed => {
                warn!("reconnection attempts exhausted");
                let _ = out.send(ChatEvent::ReconnectFailed);
            }
            TransportEvent::Event { event, args, ack } => {
                on_push(&event, args, ack, &out);
            }
        }
    }
    debug!("transport event stream ended");
}

async fn apply(
    status: &Mutex<ConnectionStatus>,
    out: &mpsc::UnboundedSender<ChatEvent>,
    event: Lifecycle,
) {
    let notices = {
        let mut status = status.lock().await;
        let (next, notices) = status.on_event(event);
        *status = next;
        notices
    };

    for notice in notices {
        let event = match notice {
            StatusNotice::Connected => {
                info!("connected");
                ChatEvent::Connected
            }
            StatusNotice::Disconnected { reason } => {
                info!(%reason, "disconnected");
                ChatEvent::Disconnected { reason }
            }
            StatusNotice::Error(fault) => {
                warn!("{}", fault);
                ChatEvent::Error(fault)
            }
        };
        let _ = out.send(event);
    }
}

fn on_push(
    event: &str,
    args: Vec<Value>,
    ack: Option<AckHandle>,
    out: &mpsc::UnboundedSender<ChatEvent>,
) {
    if event != Channel::Message.as_str() {
        debug!(event, "ignoring unsupported server event");
        return;
    }

    let Some(payload) = args.into_iter().next() else {
        warn!("pushed message without payload");
        return;
    };
    match serde_json::from_value::<Message>(payload) {
        Ok(message) => {
            debug!(id = ?message.id, to = %message.to, "message received");
            let ack = MessageAck::new(ack, message.id.clone());
            let _ = out.send(ChatEvent::Message { message, ack });
        }
        Err(e) => warn!("undecodable pushed message: {}", e),
    }
}
