//! Offline demo server for `--mock`.
//!
//! Wraps [`MockTransport`], connecting immediately and answering every
//! request the way a cooperative server would.

use async_trait::async_trait;
use chat_client::transport::{AckReceiver, ConnectOptions, TransportEvents};
use chat_client::{MockTransport, Transport, TransportError};
use chat_types::Channel;
use serde_json::{json, Value};
use uuid::Uuid;

/// Text of the message pushed right after connecting.
pub const WELCOME: &str = "Welcome to the offline demo";

/// Messages kept in each demo archive.
const ARCHIVE_SIZE: u64 = 5;

/// Transport that plays a friendly server.
#[derive(Debug, Clone, Default)]
pub struct DemoTransport {
    inner: MockTransport,
}

impl DemoTransport {
    /// Create a new demo transport.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for DemoTransport {
    async fn connect(&self, options: ConnectOptions) -> Result<TransportEvents, TransportError> {
        let user_id = options.auth.user_id.clone();
        let events = self.inner.connect(options).await?;
        self.inner.simulate_connect();
        self.inner.push_message(json!({
            "id": Uuid::new_v4().to_string(),
            "to": user_id,
            "timestamp": 0,
            "body": {"text": WELCOME},
            "from": "demo"
        }));
        Ok(events)
    }

    async fn emit_with_ack(
        &self,
        event: &str,
        args: Vec<Value>,
    ) -> Result<AckReceiver, TransportError> {
        self.inner.queue_ack(event, reply_for(event, &args));
        self.inner.emit_with_ack(event, args).await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.inner.close().await
    }
}

fn reply_for(event: &str, args: &[Value]) -> Vec<Value> {
    match event.parse::<Channel>() {
        Ok(Channel::Message) => vec![json!(Uuid::new_v4().to_string())],
        Ok(Channel::LoadArchive) => {
            let chat = args.first().cloned().unwrap_or(Value::Null);
            let limit = args.get(1).and_then(Value::as_u64).unwrap_or(0);
            let first = match args.get(2).and_then(Value::as_str) {
                Some(after) => after
                    .strip_prefix("demo-")
                    .and_then(|n| n.parse::<u64>().ok())
                    .map_or(ARCHIVE_SIZE + 1, |n| n + 1),
                None => ARCHIVE_SIZE.saturating_sub(limit) + 1,
            };
            let messages: Vec<Value> = (first..=ARCHIVE_SIZE)
                .take(limit as usize)
                .map(|n| {
                    json!({
                        "id": format!("demo-{n}"),
                        "to": chat,
                        "timestamp": n,
                        "body": {"text": format!("Archived message {n}")},
                        "from": "demo"
                    })
                })
                .collect();
            vec![json!(messages)]
        }
        Ok(Channel::JoinChat) | Ok(Channel::LeaveChat) => vec![json!(true)],
        Ok(Channel::CreateChat) => vec![json!(format!("chat-{}", Uuid::new_v4()))],
        Err(_) => vec![Value::Null, json!({"code": 404, "error": "unknown_event"})],
    }
}
