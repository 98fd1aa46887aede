//! Join a chat.

use anyhow::{Context, Result};
use chat_client::{ChatClient, Transport};

use super::{connect, finish};

/// Run the join command.
///
/// A temporary join only lasts as long as this command's connection.
pub async fn run<T: Transport>(client: &ChatClient<T>, chat: &str, temporary: bool) -> Result<()> {
    let _events = connect(client).await?;
    let result = client.join_chat(chat, temporary).await;
    finish(client).await;

    if !result.context("Failed to join chat")? {
        anyhow::bail!("Server declined to join {}", chat);
    }
    if temporary {
        println!("Joined {} (temporary)", chat);
    } else {
        println!("Joined {}", chat);
    }
    Ok(())
}
