//! # chat-types
//!
//! Data model and wire frames for the simple-chat client SDK.
//!
//! This crate provides the foundational types used across all simple-chat crates:
//! - [`Message`], [`ChatType`] - Chat payloads exchanged with the server
//! - [`AppError`], [`ValidationError`] - Errors surfaced to callers
//! - [`Frame`], [`Channel`], [`Auth`] - WebSocket wire frames and request channels
//! - [`ProtocolError`] - Encoding errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod frame;
mod messages;

pub use error::ProtocolError;
pub use frame::{Auth, Channel, Frame};
pub use messages::{AppError, ChatType, Message, MessageBody, ValidationError};
