//! # chat-client
//!
//! Client library for the simple-chat realtime protocol.
//!
//! This is the library that applications use to talk to a chat server.
//!
//! ## Features
//!
//! - **Typed Requests**: send, archive, join, leave and create with typed results
//! - **Status Tracking**: strictly alternating connected/disconnected notifications
//! - **Transport Abstraction**: Pluggable transport layer (WebSocket, mock)
//! - **Pure State Machine**: Uses chat-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use chat_client::{ChatClient, ChatConfig, ChatEvent, WebSocketTransport};
//!
//! let config = ChatConfig::new("ws://localhost", 3000, "alice", "token");
//! let client = ChatClient::new(config, WebSocketTransport::new());
//! let mut events = client.take_events().await.expect("events taken once");
//! client.start().await?;
//!
//! // Join a room for this connection only
//! client.join_chat("lobby", true).await?;
//!
//! while let Some(ChatEvent::Message { message, ack }) = events.recv().await {
//!     println!("{:?}", message.text_body());
//!     ack.ack();
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod event;
pub mod transport;

pub use chat_core::{ConnectionFault, ConnectionStatus, FaultKind};
pub use chat_types::{AppError, ChatType, Message, MessageBody, ValidationError};
pub use client::{ChatClient, ChatError};
pub use config::{AccessToken, ChatConfig};
pub use event::{ChatEvent, ChatEvents, MessageAck};
pub use transport::{
    AckHandle, ConnectOptions, MockTransport, Transport, TransportError, TransportEvent,
    WebSocketTransport, WebSocketTransportConfig,
};
