//! Load archived messages of a chat.

use anyhow::{Context, Result};
use chat_client::{ChatClient, Transport};

use super::{connect, finish, format_message};

/// Run the archive command.
pub async fn run<T: Transport>(
    client: &ChatClient<T>,
    chat: &str,
    limit: u32,
    after: Option<&str>,
) -> Result<()> {
    let _events = connect(client).await?;
    let result = client.load_archive(chat, limit, after).await;
    finish(client).await;

    let messages = result.context("Failed to load archive")?;
    if messages.is_empty() {
        println!("No messages.");
        return Ok(());
    }
    for message in &messages {
        println!("{}", format_message(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::demo::DemoTransport;
    use chat_client::ChatConfig;

    #[tokio::test]
    async fn archive_with_demo_transport() {
        let client = ChatClient::new(
            ChatConfig::new("ws://demo", 0, "alice", ""),
            DemoTransport::new(),
        );
        assert!(run(&client, "lobby", 3, None).await.is_ok());
    }
}
