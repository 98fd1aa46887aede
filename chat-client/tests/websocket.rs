//! End-to-end tests for ChatClient over the real WebSocket transport.
//!
//! Each test runs an in-process tokio-tungstenite server speaking the
//! frame protocol.

extern crate simple_chat_client as chat_client;

use chat_client::{
    ChatClient, ChatConfig, ChatError, ChatEvent, ChatEvents, ChatType, ConnectionStatus,
    FaultKind, Message, Transport, WebSocketTransport, WebSocketTransportConfig,
};
use chat_types::{Channel, Frame};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{accept_async, WebSocketStream};
use uuid::Uuid;

const TOKEN: &str = "secret";

/// What the test server observed from clients.
enum Seen {
    /// Acknowledgement for a pushed message.
    Ack(Vec<Value>),
    /// Graceful disconnect frame.
    Disconnect,
}

struct TestServer {
    port: u16,
    connections: Arc<AtomicUsize>,
    seen: mpsc::UnboundedReceiver<Seen>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));
        let (seen_tx, seen) = mpsc::unbounded_channel();

        let counter = Arc::clone(&connections);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, seen_tx.clone()));
            }
        });

        Self {
            port,
            connections,
            seen,
        }
    }

    fn client(&self, token: &str) -> ChatClient<WebSocketTransport> {
        self.client_with_delay(token, Duration::from_millis(10))
    }

    /// Client whose reconnects wait at least half of `delay`.
    fn client_with_delay(&self, token: &str, delay: Duration) -> ChatClient<WebSocketTransport> {
        let config = ChatConfig::new("ws://127.0.0.1", self.port, "alice", token)
            .with_max_reconnect_attempts(3);
        let transport = WebSocketTransport::with_config(WebSocketTransportConfig {
            connect_timeout: Duration::from_secs(2),
            reconnect_delay: delay,
            reconnect_delay_max: delay * 5,
        });
        ChatClient::new(config, transport)
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    async fn next_seen(&mut self) -> Seen {
        tokio::time::timeout(Duration::from_secs(5), self.seen.recv())
            .await
            .expect("timed out waiting for server observation")
            .expect("server stopped")
    }
}

async fn send(ws: &mut WebSocketStream<TcpStream>, frame: Frame) {
    let text = frame.to_text().unwrap();
    let _ = ws.send(WsMessage::Text(text.into())).await;
}

async fn serve(stream: TcpStream, seen: mpsc::UnboundedSender<Seen>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    let Some(Ok(WsMessage::Text(text))) = ws.next().await else {
        return;
    };
    let Ok(Frame::Connect { auth }) = Frame::from_text(text.as_str()) else {
        return;
    };
    if auth.token != TOKEN {
        send(
            &mut ws,
            Frame::ConnectError {
                message: "invalid token".into(),
            },
        )
        .await;
        return;
    }
    send(&mut ws, Frame::ConnectOk).await;

    let mut push_id = 1000;
    while let Some(Ok(incoming)) = ws.next().await {
        let WsMessage::Text(text) = incoming else {
            continue;
        };
        match Frame::from_text(text.as_str()).unwrap() {
            Frame::Event {
                event,
                args,
                id: Some(id),
            } => {
                let reply = match event.parse::<Channel>().unwrap() {
                    Channel::Message => {
                        let to = args[0]["to"].as_str().unwrap_or_default().to_string();
                        match to.as_str() {
                            // Vanish without a close handshake
                            "drop" => return,
                            "bad" => vec![Value::Null, json!({"code": 400, "error": "bad_request"})],
                            _ => {
                                let message_id = Uuid::new_v4().to_string();
                                let mut echoed = args[0].clone();
                                echoed["id"] = json!(message_id);
                                echoed["from"] = json!(auth.user_id);
                                send(&mut ws, Frame::event("message", vec![echoed], Some(push_id)))
                                    .await;
                                push_id += 1;
                                vec![json!(message_id)]
                            }
                        }
                    }
                    Channel::LoadArchive => {
                        let first = if args[2].is_null() { 90 } else { 1 };
                        let messages: Vec<Value> = (first..first + args[1].as_u64().unwrap())
                            .map(|n| json!({"id": format!("m-{n}"), "to": args[0], "timestamp": n}))
                            .collect();
                        vec![json!(messages)]
                    }
                    // Kick the client instead of answering
                    Channel::LeaveChat if args[0] == "kick" => {
                        send(&mut ws, Frame::Disconnect { reason: None }).await;
                        return;
                    }
                    Channel::JoinChat | Channel::LeaveChat => vec![json!(true)],
                    Channel::CreateChat => vec![json!(format!("chat-{}", Uuid::new_v4()))],
                };
                send(&mut ws, Frame::Ack { id, args: reply }).await;
            }
            Frame::Ack { args, .. } => {
                let _ = seen.send(Seen::Ack(args));
            }
            Frame::Disconnect { .. } => {
                let _ = seen.send(Seen::Disconnect);
                return;
            }
            _ => {}
        }
    }
}

async fn next(events: &mut ChatEvents) -> ChatEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream closed")
}

async fn connected(client: &ChatClient<WebSocketTransport>) -> ChatEvents {
    let mut events = client.take_events().await.unwrap();
    client.start().await.unwrap();
    match next(&mut events).await {
        ChatEvent::Connected => {}
        other => panic!("Expected Connected, got {:?}", other),
    }
    events
}

// ===========================================
// Request Round-Trips
// ===========================================

#[tokio::test]
async fn send_message_round_trip() {
    let mut server = TestServer::start().await;
    let client = server.client(TOKEN);
    let mut events = connected(&client).await;

    let id = client
        .send_message(&Message::text("bob", 1700000000, "hello"))
        .await
        .unwrap();
    assert!(Uuid::parse_str(&id).is_ok(), "got id {}", id);

    // The server echoes the message back as a push
    match next(&mut events).await {
        ChatEvent::Message { message, ack } => {
            assert_eq!(message.id.as_deref(), Some(id.as_str()));
            assert_eq!(message.from.as_deref(), Some("alice"));
            assert_eq!(message.text_body(), Some("hello"));
            assert!(ack.is_required());
            ack.ack();
        }
        other => panic!("Expected Message, got {:?}", other),
    }

    match server.next_seen().await {
        Seen::Ack(args) => assert!(args.is_empty()),
        Seen::Disconnect => panic!("Expected ack"),
    }

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn server_error_rejects_request() {
    let server = TestServer::start().await;
    let client = server.client(TOKEN);
    let _events = connected(&client).await;

    let result = client.send_message(&Message::new("bad", 1)).await;

    match result {
        Err(ChatError::App(err)) => {
            assert_eq!(err.code, 400);
            assert_eq!(err.error, "bad_request");
        }
        other => panic!("Expected App error, got {:?}", other),
    }
}

#[tokio::test]
async fn archive_join_leave_create() {
    let server = TestServer::start().await;
    let client = server.client(TOKEN);
    let _events = connected(&client).await;

    let latest = client.load_archive("lobby", 3, None).await.unwrap();
    assert_eq!(latest.len(), 3);
    assert_eq!(latest[0].id.as_deref(), Some("m-90"));
    assert_eq!(latest[0].to, "lobby");

    let after = client.load_archive("lobby", 2, Some("m-0")).await.unwrap();
    assert_eq!(after[0].id.as_deref(), Some("m-1"));

    assert!(client.join_chat("lobby", true).await.unwrap());
    assert!(client.leave_chat("lobby").await.unwrap());

    let chat_id = client
        .create_chat(ChatType::Suc, &["alice".to_string(), "bob".to_string()])
        .await
        .unwrap();
    assert!(chat_id.starts_with("chat-"));
}

#[tokio::test]
async fn concurrent_requests_over_one_socket() {
    let server = TestServer::start().await;
    let client = Arc::new(server.client(TOKEN));
    let _events = connected(&client).await;

    let mut tasks = Vec::new();
    for n in 0..10u32 {
        let client = Arc::clone(&client);
        tasks.push(tokio::spawn(async move {
            client.load_archive(&format!("room-{n}"), n + 1, None).await
        }));
    }

    for (n, task) in tasks.into_iter().enumerate() {
        let messages = task.await.unwrap().unwrap();
        assert_eq!(messages.len(), n + 1);
        assert_eq!(messages[0].to, format!("room-{n}"));
    }
}

// ===========================================
// Lifecycle
// ===========================================

#[tokio::test]
async fn rejected_token_reports_error_without_retrying() {
    let server = TestServer::start().await;
    let client = server.client("wrong");
    let mut events = client.take_events().await.unwrap();

    client.start().await.unwrap();

    match next(&mut events).await {
        ChatEvent::Error(fault) => {
            assert_eq!(fault.kind, FaultKind::Connect);
            assert_eq!(fault.message, "invalid token");
        }
        other => panic!("Expected Error, got {:?}", other),
    }
    assert_eq!(client.status().await, ConnectionStatus::Disconnected);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn lost_connection_reconnects() {
    let server = TestServer::start().await;
    let client = server.client(TOKEN);
    let mut events = connected(&client).await;

    let result = client.send_message(&Message::new("drop", 1)).await;
    assert!(matches!(
        result,
        Err(ChatError::AcknowledgementDropped {
            channel: Channel::Message
        })
    ));

    let mut seen = Vec::new();
    loop {
        match next(&mut events).await {
            ChatEvent::Connected => break,
            ChatEvent::Disconnected { .. } => seen.push("disconnected"),
            ChatEvent::ReconnectAttempt { attempt: 1 } => seen.push("attempt"),
            ChatEvent::Reconnect { attempt: 1 } => seen.push("reconnect"),
            ChatEvent::Error(_) => {}
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(seen, vec!["disconnected", "attempt", "reconnect"]);
    assert_eq!(server.connections(), 2);

    // The new connection carries requests again
    assert!(client.join_chat("lobby", false).await.unwrap());
}

#[tokio::test]
async fn disconnect_is_graceful() {
    let mut server = TestServer::start().await;
    let client = server.client(TOKEN);
    let mut events = connected(&client).await;

    client.disconnect().await.unwrap();

    match next(&mut events).await {
        ChatEvent::Disconnected { reason } => assert_eq!(reason, "io client disconnect"),
        other => panic!("Expected Disconnected, got {:?}", other),
    }
    assert!(matches!(server.next_seen().await, Seen::Disconnect));
    assert!(!client.is_connected().await);
    assert!(!client.transport().is_connected());
}

#[tokio::test]
async fn requests_while_disconnected_flush_after_reconnect() {
    let server = TestServer::start().await;
    let client = Arc::new(server.client_with_delay(TOKEN, Duration::from_millis(400)));
    let mut events = connected(&client).await;

    let _ = client.send_message(&Message::new("drop", 1)).await;
    loop {
        match next(&mut events).await {
            ChatEvent::Disconnected { .. } => break,
            ChatEvent::Error(_) => {}
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert!(!client.transport().is_connected());

    // Issued during the backoff, before any new socket exists
    let join = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.join_chat("lobby", false).await })
    };

    loop {
        match next(&mut events).await {
            ChatEvent::Connected => break,
            ChatEvent::ReconnectAttempt { .. } | ChatEvent::Reconnect { .. } => {}
            other => panic!("unexpected event {:?}", other),
        }
    }

    let joined = tokio::time::timeout(Duration::from_secs(5), join)
        .await
        .expect("queued request must be sent after reconnecting")
        .unwrap();
    assert!(joined.unwrap());
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn server_disconnect_does_not_reconnect() {
    let server = TestServer::start().await;
    let client = server.client(TOKEN);
    let mut events = connected(&client).await;

    let result = client.leave_chat("kick").await;
    assert!(matches!(
        result,
        Err(ChatError::AcknowledgementDropped {
            channel: Channel::LeaveChat
        })
    ));

    match next(&mut events).await {
        ChatEvent::Disconnected { reason } => assert_eq!(reason, "io server disconnect"),
        other => panic!("Expected Disconnected, got {:?}", other),
    }

    // No reconnection follows
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.connections(), 1);
    assert!(tokio::time::timeout(Duration::from_millis(50), events.recv())
        .await
        .is_err());
    assert_eq!(client.status().await, ConnectionStatus::Disconnected);

    // The ended session leaves the client restartable
    client.start().await.unwrap();
    assert!(matches!(next(&mut events).await, ChatEvent::Connected));
    assert_eq!(server.connections(), 2);
}
