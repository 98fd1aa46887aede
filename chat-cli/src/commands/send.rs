//! Send a message or typing indicator.

use anyhow::{Context, Result};
use chat_client::{ChatClient, Message, Transport};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{connect, finish};

/// Run the send command.
pub async fn run<T: Transport>(
    client: &ChatClient<T>,
    to: &str,
    text: Option<&str>,
    typing: bool,
) -> Result<()> {
    let message = build_message(to, text, typing);

    let _events = connect(client).await?;
    let result = client.send_message(&message).await;
    finish(client).await;

    let id = result.context("Failed to send message")?;
    println!("Message sent: {}", id);
    Ok(())
}

fn build_message(to: &str, text: Option<&str>, typing: bool) -> Message {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let message = match text {
        Some(text) => Message::text(to, timestamp, text),
        None => Message::new(to, timestamp),
    };
    if typing {
        message.with_typing(true)
    } else {
        message
    }
}
