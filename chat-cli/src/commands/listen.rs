//! Print notifications and incoming messages.

use anyhow::Result;
use chat_client::{ChatClient, ChatEvent, ChatEvents, Transport};

use super::{connect, finish, format_message};

/// Run the listen command.
///
/// Acknowledges every pushed message. Stops after `count` messages, on
/// Ctrl-C, or when the connection gives up.
pub async fn run<T: Transport>(client: &ChatClient<T>, count: Option<usize>) -> Result<()> {
    let events = connect(client).await?;
    println!("Connected as {}. Press Ctrl-C to stop.", client.config().user_id);

    let result = tokio::select! {
        result = print_events(events, count) => result,
        _ = tokio::signal::ctrl_c() => Ok(()),
    };
    finish(client).await;
    result
}

async fn print_events(mut events: ChatEvents, count: Option<usize>) -> Result<()> {
    let mut received = 0;
    if count == Some(0) {
        return Ok(());
    }

    while let Some(event) = events.recv().await {
        match event {
            ChatEvent::Message { message, ack } => {
                println!("{}", format_message(&message));
                ack.ack();
                received += 1;
                if count.is_some_and(|n| received >= n) {
                    return Ok(());
                }
            }
            ChatEvent::Connected => println!("Connected"),
            ChatEvent::Disconnected { reason } => println!("Disconnected: {}", reason),
            ChatEvent::Error(fault) => println!("Error: {}", fault),
            ChatEvent::ReconnectAttempt { attempt } => println!("Reconnecting (attempt {})...", attempt),
            ChatEvent::ReconnectError { error } => println!("Reconnect failed: {}", error),
            ChatEvent::Reconnect { attempt } => println!("Reconnected after {} attempt(s)", attempt),
            ChatEvent::ReconnectFailed => anyhow::bail!("Gave up reconnecting"),
        }
    }
    Ok(())
}
