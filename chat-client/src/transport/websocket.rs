//! WebSocketTransport - JSON frames over tokio-tungstenite.
//!
//! A background driver task owns the socket. It performs the `connect`
//! handshake, correlates requests with their `ack` frames, hands server
//! pushes to the event stream, and reconnects with exponential backoff
//! after an unexpected loss.

use super::{
    AckHandle, AckReceiver, ConnectOptions, Transport, TransportError, TransportEvent,
    TransportEvents,
};
use async_trait::async_trait;
use chat_core::PendingAcks;
use chat_types::Frame;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;
type AckSender = oneshot::Sender<Vec<Value>>;

/// Disconnect reason when the client closes the connection.
const CLIENT_DISCONNECT: &str = "io client disconnect";
/// Disconnect reason when the server sends a `disconnect` frame without one.
const SERVER_DISCONNECT: &str = "io server disconnect";
/// Disconnect reason when the socket closes unexpectedly.
const TRANSPORT_CLOSE: &str = "transport close";
/// Disconnect reason when the socket fails.
const TRANSPORT_ERROR: &str = "transport error";

/// Configuration for WebSocketTransport.
#[derive(Clone, Debug)]
pub struct WebSocketTransportConfig {
    /// Time allowed for the socket to open and the handshake to complete.
    pub connect_timeout: Duration,
    /// Delay before the first reconnection attempt.
    pub reconnect_delay: Duration,
    /// Upper bound for the reconnection delay.
    pub reconnect_delay_max: Duration,
}

impl Default for WebSocketTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
            reconnect_delay: Duration::from_secs(1),
            reconnect_delay_max: Duration::from_secs(5),
        }
    }
}

/// A request waiting to be written to the socket.
struct Outgoing {
    event: String,
    args: Vec<Value>,
    reply: oneshot::Sender<Vec<Value>>,
}

/// Handles to a running driver task.
struct Session {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    shutdown: watch::Sender<bool>,
    driver: JoinHandle<()>,
}

/// WebSocketTransport implements the Transport trait over a WebSocket.
///
/// # Example
///
/// ```ignore
/// let transport = WebSocketTransport::new();
/// let mut events = transport.connect(options).await?;
///
/// while let Some(event) = events.recv().await {
///     println!("{:?}", event);
/// }
/// ```
pub struct WebSocketTransport {
    config: WebSocketTransportConfig,
    connected: Arc<AtomicBool>,
    session: Mutex<Option<Session>>,
}

impl WebSocketTransport {
    /// Create a transport with default timeouts and backoff.
    pub fn new() -> Self {
        Self::with_config(WebSocketTransportConfig::default())
    }

    /// Create a transport with custom configuration.
    pub fn with_config(config: WebSocketTransportConfig) -> Self {
        Self {
            config,
            connected: Arc::new(AtomicBool::new(false)),
            session: Mutex::new(None),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &WebSocketTransportConfig {
        &self.config
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, options: ConnectOptions) -> Result<TransportEvents, TransportError> {
        // Close existing connection if any
        self.close().await?;

        if !options.url.starts_with("ws://") && !options.url.starts_with("wss://") {
            return Err(TransportError::ConnectionFailed(format!(
                "unsupported url: {}",
                options.url
            )));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = Driver {
            options,
            config: self.config.clone(),
            connected: Arc::clone(&self.connected),
            events: events_tx,
            outgoing: outgoing_rx,
            shutdown: shutdown_rx,
        };

        *self.session.lock().await = Some(Session {
            outgoing: outgoing_tx,
            shutdown: shutdown_tx,
            driver: tokio::spawn(driver.run()),
        });
        Ok(events_rx)
    }

    async fn emit_with_ack(
        &self,
        event: &str,
        args: Vec<Value>,
    ) -> Result<AckReceiver, TransportError> {
        let session = self.session.lock().await;
        let session = session.as_ref().ok_or(TransportError::NotConnected)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        session
            .outgoing
            .send(Outgoing {
                event: event.to_string(),
                args,
                reply: reply_tx,
            })
            .map_err(|_| TransportError::ConnectionClosed)?;
        Ok(reply_rx)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            let _ = session.shutdown.send(true);
            if let Err(e) = session.driver.await {
                warn!("websocket driver ended abnormally: {}", e);
            }
        }
        Ok(())
    }
}

/// How a connected session ended.
enum SessionEnd {
    /// Closed by us.
    Closed,
    /// Closed by the server; no reconnection.
    ServerClosed(String),
    /// Lost unexpectedly; reconnection follows.
    Lost(String),
}

/// Why a handshake failed.
enum HandshakeError {
    /// The server answered `connect_error`.
    Rejected(String),
    /// The socket could not be opened or the handshake did not complete.
    Failed(String),
}

struct Driver {
    options: ConnectOptions,
    config: WebSocketTransportConfig,
    connected: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<TransportEvent>,
    outgoing: mpsc::UnboundedReceiver<Outgoing>,
    shutdown: watch::Receiver<bool>,
}

impl Driver {
    async fn run(mut self) {
        // 0 while the first connection is being made
        let mut attempt: u32 = 0;

        loop {
            if attempt > 0 {
                if self
                    .options
                    .reconnection_attempts
                    .is_some_and(|max| attempt > max)
                {
                    warn!(attempts = attempt - 1, "giving up reconnecting");
                    self.emit(TransportEvent::ReconnectFailed);
                    break;
                }
                let delay = backoff(&self.config, attempt);
                debug!(attempt, ?delay, "waiting before reconnect");
                if self.wait_or_shutdown(delay).await {
                    break;
                }
                self.emit(TransportEvent::ReconnectAttempt(attempt));
            }

            let result = tokio::select! {
                result = handshake(&self.options, self.config.connect_timeout) => result,
                _ = self.shutdown.changed() => break,
            };

            match result {
                Ok(ws) => {
                    info!(url = %self.options.url, "websocket connected");
                    self.connected.store(true, Ordering::SeqCst);
                    if attempt > 0 {
                        self.emit(TransportEvent::Reconnect(attempt));
                    }
                    self.emit(TransportEvent::Connect);
                    attempt = 0;

                    let end = self.session(ws).await;
                    self.connected.store(false, Ordering::SeqCst);
                    match end {
                        SessionEnd::Closed => {
                            self.emit(TransportEvent::Disconnect {
                                reason: CLIENT_DISCONNECT.to_string(),
                            });
                            break;
                        }
                        SessionEnd::ServerClosed(reason) => {
                            self.emit(TransportEvent::Disconnect { reason });
                            break;
                        }
                        SessionEnd::Lost(reason) => {
                            info!(%reason, "websocket connection lost");
                            self.emit(TransportEvent::Disconnect { reason });
                            attempt = 1;
                        }
                    }
                }
                Err(HandshakeError::Rejected(message)) => {
                    warn!(%message, "connection rejected by server");
                    self.emit(TransportEvent::ConnectError(message));
                    break;
                }
                Err(HandshakeError::Failed(message)) => {
                    debug!(%message, attempt, "connection attempt failed");
                    if attempt > 0 {
                        self.emit(TransportEvent::ReconnectError(message));
                    } else {
                        self.emit(TransportEvent::ConnectError(message));
                    }
                    attempt += 1;
                }
            }
        }

        self.connected.store(false, Ordering::SeqCst);
        debug!("websocket driver stopped");
    }

    /// Pump one connected socket until it ends.
    async fn session(&mut self, ws: WsStream) -> SessionEnd {
        let (mut sink, mut stream) = ws.split();
        let mut pending: PendingAcks<AckSender> = PendingAcks::new();
        // Acks for server pushes, written by the session loop
        let (replies_tx, mut replies_rx) = mpsc::unbounded_channel::<Frame>();

        loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(WsMessage::Text(text))) => match Frame::from_text(text.as_str()) {
                        Ok(frame) => {
                            if let Some(end) = self.on_frame(frame, &mut pending, &replies_tx) {
                                return end;
                            }
                        }
                        Err(e) => warn!("dropping undecodable frame: {}", e),
                    },
                    Some(Ok(WsMessage::Close(_))) | None => {
                        return SessionEnd::Lost(TRANSPORT_CLOSE.to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        self.emit(TransportEvent::Error(e.to_string()));
                        return SessionEnd::Lost(TRANSPORT_ERROR.to_string());
                    }
                },
                request = self.outgoing.recv() => {
                    let Some(request) = request else {
                        let _ = sink.close().await;
                        return SessionEnd::Closed;
                    };
                    let id = track(&mut pending, request.reply);
                    debug!(event = %request.event, id, "sending request");
                    let frame = Frame::event(request.event, request.args, Some(id));
                    if let Err(e) = send_frame(&mut sink, &frame).await {
                        self.emit(TransportEvent::Error(e.to_string()));
                        return SessionEnd::Lost(TRANSPORT_ERROR.to_string());
                    }
                }
                Some(reply) = replies_rx.recv() => {
                    if let Err(e) = send_frame(&mut sink, &reply).await {
                        self.emit(TransportEvent::Error(e.to_string()));
                        return SessionEnd::Lost(TRANSPORT_ERROR.to_string());
                    }
                }
                _ = self.shutdown.changed() => {
                    let _ = send_frame(&mut sink, &Frame::Disconnect { reason: None }).await;
                    let _ = sink.close().await;
                    return SessionEnd::Closed;
                }
            }
        }
    }

    fn on_frame(
        &self,
        frame: Frame,
        pending: &mut PendingAcks<AckSender>,
        replies: &mpsc::UnboundedSender<Frame>,
    ) -> Option<SessionEnd> {
        match frame {
            Frame::Ack { id, args } => match pending.complete(id) {
                Some(reply) => {
                    let _ = reply.send(args);
                }
                None => warn!(id, "ack for unknown request"),
            },
            Frame::Event { event, args, id } => {
                let ack = id.map(|id| {
                    let replies = replies.clone();
                    AckHandle::new(move |args| {
                        let _ = replies.send(Frame::Ack { id, args });
                    })
                });
                self.emit(TransportEvent::Event { event, args, ack });
            }
            Frame::Disconnect { reason } => {
                return Some(SessionEnd::ServerClosed(
                    reason.unwrap_or_else(|| SERVER_DISCONNECT.to_string()),
                ));
            }
            other => debug!(?other, "ignoring unexpected frame"),
        }
        None
    }

    fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    /// Sleep for `delay`. Returns true if shutdown was requested meanwhile.
    async fn wait_or_shutdown(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = self.shutdown.changed() => true,
        }
    }
}

/// Open the socket and exchange `connect` / `connect_ok` within `timeout`.
async fn handshake(options: &ConnectOptions, timeout: Duration) -> Result<WsStream, HandshakeError> {
    tokio::time::timeout(timeout, open(options))
        .await
        .map_err(|_| HandshakeError::Failed("timeout".to_string()))?
}

async fn open(options: &ConnectOptions) -> Result<WsStream, HandshakeError> {
    let (mut ws, _) = connect_async(options.url.as_str())
        .await
        .map_err(|e| HandshakeError::Failed(e.to_string()))?;

    let hello = Frame::Connect {
        auth: options.auth.clone(),
    }
    .to_text()
    .map_err(|e| HandshakeError::Failed(e.to_string()))?;
    ws.send(WsMessage::Text(hello.into()))
        .await
        .map_err(|e| HandshakeError::Failed(e.to_string()))?;

    loop {
        match ws.next().await {
            Some(Ok(WsMessage::Text(text))) => match Frame::from_text(text.as_str()) {
                Ok(Frame::ConnectOk) => return Ok(ws),
                Ok(Frame::ConnectError { message }) => return Err(HandshakeError::Rejected(message)),
                Ok(other) => debug!(?other, "ignoring frame before handshake"),
                Err(e) => return Err(HandshakeError::Failed(e.to_string())),
            },
            Some(Ok(WsMessage::Close(_))) | None => {
                return Err(HandshakeError::Failed(
                    "connection closed during handshake".to_string(),
                ))
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(HandshakeError::Failed(e.to_string())),
        }
    }
}

/// Register a request's reply slot and return its id.
///
/// Slots whose caller stopped waiting (a timed-out or cancelled request)
/// are dropped first, so unanswered requests cannot pile up in the table.
fn track(pending: &mut PendingAcks<AckSender>, reply: AckSender) -> u64 {
    pending.retain(|slot| !slot.is_closed());
    pending.register(reply)
}

async fn send_frame(sink: &mut WsSink, frame: &Frame) -> Result<(), TransportError> {
    let text = frame.to_text()?;
    sink.send(WsMessage::Text(text.into()))
        .await
        .map_err(|e| TransportError::SendFailed(e.to_string()))
}

/// Delay before reconnection attempt `attempt` (1-based).
///
/// `reconnect_delay * 2^(attempt-1)` capped at `reconnect_delay_max`, then
/// scaled by a random factor in `[0.5, 1.5)` and capped again.
fn backoff(config: &WebSocketTransportConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let base = config
        .reconnect_delay
        .saturating_mul(1u32 << exponent)
        .min(config.reconnect_delay_max);

    let mut bytes = [0u8; 4];
    let unit = match getrandom::getrandom(&mut bytes) {
        Ok(()) => f64::from(u32::from_le_bytes(bytes)) / (f64::from(u32::MAX) + 1.0),
        Err(_) => 0.5,
    };
    Duration::try_from_secs_f64(base.as_secs_f64() * (0.5 + unit))
        .unwrap_or(config.reconnect_delay_max)
        .min(config.reconnect_delay_max)
}
