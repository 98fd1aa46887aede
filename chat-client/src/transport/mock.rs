//! Mock transport for testing.
//!
//! Allows scripting acknowledgements, simulating lifecycle events and
//! server pushes, and capturing emitted requests for verification.

use super::{
    AckHandle, AckReceiver, ConnectOptions, Transport, TransportError, TransportEvent,
    TransportEvents,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// A request captured by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedRequest {
    /// Event name.
    pub event: String,
    /// Positional arguments.
    pub args: Vec<Value>,
}

/// Mock transport for testing.
///
/// Allows scripting acknowledgements and capturing emitted requests.
/// Clones share state, so a test can keep one handle while the client owns
/// another.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connect_options: Option<ConnectOptions>,
    connect_count: usize,
    events: Option<mpsc::UnboundedSender<TransportEvent>>,
    emitted: Vec<EmittedRequest>,
    scripted_acks: HashMap<String, VecDeque<Vec<Value>>>,
    unanswered: VecDeque<(String, oneshot::Sender<Vec<Value>>)>,
    inbound_acks: Vec<Vec<Value>>,
    fail_next_connect: Option<String>,
    fail_next_emit: Option<String>,
    fail_next_close: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next request on `event` immediately with `args`.
    pub fn queue_ack(&self, event: &str, args: Vec<Value>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .scripted_acks
            .entry(event.to_string())
            .or_default()
            .push_back(args);
    }

    /// Answer the oldest unanswered request on `event`.
    ///
    /// Returns false if no such request is waiting.
    pub fn answer(&self, event: &str, args: Vec<Value>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let position = inner.unanswered.iter().position(|(name, _)| name == event);
        match position.and_then(|i| inner.unanswered.remove(i)) {
            Some((_, reply)) => reply.send(args).is_ok(),
            None => false,
        }
    }

    /// Number of requests still waiting for an acknowledgement.
    pub fn unanswered_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.unanswered.len()
    }

    /// Get all requests that were emitted.
    pub fn emitted(&self) -> Vec<EmittedRequest> {
        let inner = self.inner.lock().unwrap();
        inner.emitted.clone()
    }

    /// Get the requests emitted on one event name.
    pub fn emitted_on(&self, event: &str) -> Vec<EmittedRequest> {
        let inner = self.inner.lock().unwrap();
        inner
            .emitted
            .iter()
            .filter(|r| r.event == event)
            .cloned()
            .collect()
    }

    /// Get the last request that was emitted.
    pub fn last_emitted(&self) -> Option<EmittedRequest> {
        let inner = self.inner.lock().unwrap();
        inner.emitted.last().cloned()
    }

    /// Get the options passed to the most recent `connect()`.
    pub fn connect_options(&self) -> Option<ConnectOptions> {
        let inner = self.inner.lock().unwrap();
        inner.connect_options.clone()
    }

    /// Number of times `connect()` was called.
    pub fn connect_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.connect_count
    }

    /// Acknowledgements sent by the client for pushed events.
    pub fn inbound_acks(&self) -> Vec<Vec<Value>> {
        let inner = self.inner.lock().unwrap();
        inner.inbound_acks.clone()
    }

    /// Cause the next connect() to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_connect = Some(error.to_string());
    }

    /// Cause the next emit_with_ack() to fail with the given error.
    pub fn fail_next_emit(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_emit = Some(error.to_string());
    }

    /// Cause the next close() to fail with the given error.
    pub fn fail_next_close(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_close = Some(error.to_string());
    }

    /// Deliver an arbitrary event on the stream.
    ///
    /// Returns false if there is no open stream.
    pub fn fire(&self, event: TransportEvent) -> bool {
        let inner = self.inner.lock().unwrap();
        match &inner.events {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Simulate a successful (re)connection.
    pub fn simulate_connect(&self) -> bool {
        self.inner.lock().unwrap().connected = true;
        self.fire(TransportEvent::Connect)
    }

    /// Simulate the server dropping the connection.
    pub fn simulate_disconnect(&self, reason: &str) -> bool {
        self.inner.lock().unwrap().connected = false;
        self.fire(TransportEvent::Disconnect {
            reason: reason.to_string(),
        })
    }

    /// Simulate a failed connection attempt.
    pub fn simulate_connect_error(&self, error: &str) -> bool {
        self.inner.lock().unwrap().connected = false;
        self.fire(TransportEvent::ConnectError(error.to_string()))
    }

    /// Simulate a generic transport error.
    pub fn simulate_error(&self, error: &str) -> bool {
        self.inner.lock().unwrap().connected = false;
        self.fire(TransportEvent::Error(error.to_string()))
    }

    /// Push a `message` event that expects an acknowledgement.
    pub fn push_message(&self, message: Value) -> bool {
        let shared = Arc::clone(&self.inner);
        let ack = AckHandle::new(move |args| {
            shared.lock().unwrap().inbound_acks.push(args);
        });
        self.fire(TransportEvent::Event {
            event: "message".to_string(),
            args: vec![message],
            ack: Some(ack),
        })
    }

    /// Clear all state (requests, scripts, connection).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, options: ConnectOptions) -> Result<TransportEvents, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.fail_next_connect.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        inner.events = Some(tx);
        inner.connect_options = Some(options);
        inner.connect_count += 1;
        Ok(rx)
    }

    async fn emit_with_ack(
        &self,
        event: &str,
        args: Vec<Value>,
    ) -> Result<AckReceiver, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.events.is_none() {
            return Err(TransportError::NotConnected);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_emit.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.emitted.push(EmittedRequest {
            event: event.to_string(),
            args,
        });

        let (reply_tx, reply_rx) = oneshot::channel();
        let scripted = inner
            .scripted_acks
            .get_mut(event)
            .and_then(|queue| queue.pop_front());
        match scripted {
            Some(ack) => {
                let _ = reply_tx.send(ack);
            }
            None => inner.unanswered.push_back((event.to_string(), reply_tx)),
        }
        Ok(reply_rx)
    }

    fn is_connected(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.fail_next_close.take() {
            return Err(TransportError::SendFailed(error));
        }

        let was_connected = std::mem::replace(&mut inner.connected, false);
        if let Some(tx) = inner.events.take() {
            if was_connected {
                let _ = tx.send(TransportEvent::Disconnect {
                    reason: "io client disconnect".to_string(),
                });
            }
        }
        Ok(())
    }
}
