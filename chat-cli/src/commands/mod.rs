//! CLI command implementations.

pub mod archive;
pub mod create;
pub mod demo;
pub mod join;
pub mod leave;
pub mod listen;
pub mod send;

use anyhow::{Context, Result};
use chat_client::{ChatClient, ChatEvent, ChatEvents, Transport};
use tracing::debug;

/// Start the client and wait for the first lifecycle notification.
///
/// Fails if the connection reports an error or closes before connecting.
pub async fn connect<T: Transport>(client: &ChatClient<T>) -> Result<ChatEvents> {
    let mut events = client
        .take_events()
        .await
        .context("Client events already taken")?;

    client
        .start()
        .await
        .context("Failed to start connection")?;

    while let Some(event) = events.recv().await {
        match event {
            ChatEvent::Connected => return Ok(events),
            ChatEvent::Error(fault) => anyhow::bail!("Failed to connect: {}", fault),
            ChatEvent::Disconnected { reason } => {
                anyhow::bail!("Disconnected before connecting: {}", reason)
            }
            other => debug!(?other, "waiting for connection"),
        }
    }
    anyhow::bail!("Connection ended before connecting")
}

/// Close the connection, logging rather than failing on errors.
pub async fn finish<T: Transport>(client: &ChatClient<T>) {
    if let Err(e) = client.disconnect().await {
        tracing::warn!("disconnect failed: {}", e);
    }
}

/// One-line rendering of a message for terminal output.
pub fn format_message(message: &chat_client::Message) -> String {
    let from = message.from.as_deref().unwrap_or("?");
    let id = message.id.as_deref().unwrap_or("-");
    let content = match (message.text_body(), message.typing) {
        (Some(text), _) => text.to_string(),
        (None, Some(true)) => "(typing...)".to_string(),
        (None, _) => match &message.body {
            Some(body) => serde_json::Value::Object(body.clone()).to_string(),
            None => String::new(),
        },
    };
    format!("[{}] {} -> {}: {}", id, from, message.to, content)
}
