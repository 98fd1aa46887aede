//! Create a chat.

use anyhow::{Context, Result};
use chat_client::{ChatClient, ChatType, Transport};
use chat_core::validate_create_chat;

use super::{connect, finish};

/// Run the create command.
pub async fn run<T: Transport>(
    client: &ChatClient<T>,
    chat_type: ChatType,
    users: &[String],
) -> Result<()> {
    // Reject before opening a connection
    validate_create_chat(chat_type, users)?;

    let _events = connect(client).await?;
    let result = client.create_chat(chat_type, users).await;
    finish(client).await;

    let chat_id = result.context("Failed to create chat")?;
    println!("Created {} chat: {}", chat_type, chat_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::demo::DemoTransport;
    use chat_client::ChatConfig;

    fn client() -> ChatClient<DemoTransport> {
        ChatClient::new(
            ChatConfig::new("ws://demo", 0, "alice", ""),
            DemoTransport::new(),
        )
    }

    #[tokio::test]
    async fn create_with_demo_transport() {
        let users = vec!["alice".to_string(), "bob".to_string()];
        assert!(run(&client(), ChatType::Suc, &users).await.is_ok());
    }

    #[tokio::test]
    async fn too_many_users_fails_without_connecting() {
        let client = client();
        let users = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let result = run(&client, ChatType::Muc, &users).await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("only two users"), "got: {}", err);
        // Events are only taken once a connection is opened
        assert!(client.take_events().await.is_some());
        assert!(!client.transport().is_connected());
    }
}
