//! Leave a chat.

use anyhow::{Context, Result};
use chat_client::{ChatClient, Transport};

use super::{connect, finish};

/// Run the leave command.
pub async fn run<T: Transport>(client: &ChatClient<T>, chat: &str) -> Result<()> {
    let _events = connect(client).await?;
    let result = client.leave_chat(chat).await;
    finish(client).await;

    if !result.context("Failed to leave chat")? {
        anyhow::bail!("Server declined to leave {}", chat);
    }
    println!("Left {}", chat);
    Ok(())
}
