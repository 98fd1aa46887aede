//! # chat-core
//!
//! Pure logic for the simple-chat client SDK (no I/O, instant tests).
//!
//! This crate implements the connection status machine, acknowledgement
//! correlation and decoding, and local request validation without any
//! network access, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. The actual I/O is performed by `chat-client`, which
//! feeds transport events into these types and acts on what they return.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ack;
pub mod pending;
pub mod state;
pub mod validation;

pub use ack::{decode_ack, AckOutcome};
pub use pending::PendingAcks;
pub use state::{ConnectionFault, ConnectionStatus, FaultKind, Lifecycle, StatusNotice};
pub use validation::{validate_create_chat, MAX_CHAT_PARTICIPANTS};
