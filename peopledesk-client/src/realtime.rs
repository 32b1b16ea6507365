//! The realtime channel: one WebSocket connection per authenticated
//! session.
//!
//! A closed channel is terminal — there is no automatic reconnection or
//! backoff. The owner observes [`ChannelState::Closed`] through
//! [`RealtimeChannel::state_watch`] and reconnects by constructing a new
//! channel with a (possibly new) credential.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use shared::config::client::DEFAULT_HEARTBEAT_INTERVAL_MS;
use shared::models::ChatMessage;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

/// Failures surfaced by the realtime channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Constructing a channel without a credential is refused outright; no
    /// connection attempt is made.
    #[error("no credential; refusing to open a realtime connection")]
    MissingCredential,

    /// The WebSocket handshake failed.
    #[error("realtime connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    /// The channel is not open. The message was dropped, not queued; there
    /// is no buffering or backpressure.
    #[error("realtime channel is not open; message dropped")]
    NotConnected,

    /// The outbound value could not be encoded as a frame.
    #[error("could not encode outbound frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Callback invoked for every inbound application payload.
pub type MessageHandler = Box<dyn Fn(Value) + Send + Sync>;

/// Construction knobs for [`RealtimeChannel::connect`].
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Cadence of the keep-alive ping while the connection is open.
    pub heartbeat_interval: Duration,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
        }
    }
}

/// Clonable outbound handle, suitable for wiring into
/// [`crate::ChatStore::register_sender`].
#[derive(Clone)]
pub struct ChannelSender {
    state: watch::Receiver<ChannelState>,
    outbound: mpsc::Sender<Message>,
}

impl ChannelSender {
    /// Send an arbitrary JSON value; dropped with an error when the channel
    /// is not open.
    pub fn send_json(&self, value: &Value) -> Result<(), ChannelError> {
        if *self.state.borrow() != ChannelState::Open {
            return Err(ChannelError::NotConnected);
        }
        let frame = Message::Text(value.to_string());
        self.outbound
            .try_send(frame)
            .map_err(|_| ChannelError::NotConnected)
    }

    /// Send a chat message frame.
    pub fn send_message(&self, message: &ChatMessage) -> Result<(), ChannelError> {
        let value = serde_json::to_value(message)?;
        self.send_json(&value)
    }
}

/// A live WebSocket connection with keep-alive and inbound dispatch.
///
/// The handler is decoupled from connection identity: replace it at any
/// time with [`RealtimeChannel::set_handler`] without tearing the
/// connection down. Dropping the channel closes it.
pub struct RealtimeChannel {
    state: watch::Receiver<ChannelState>,
    outbound: mpsc::Sender<Message>,
    handler: Arc<RwLock<Option<MessageHandler>>>,
    cancel: CancellationToken,
}

impl RealtimeChannel {
    /// Open a connection to `<endpoint>?token=<credential>`.
    ///
    /// Refuses to dial at all when `token` is empty.
    pub async fn connect(
        endpoint: &Url,
        token: &str,
        options: ChannelOptions,
    ) -> Result<Self, ChannelError> {
        if token.is_empty() {
            return Err(ChannelError::MissingCredential);
        }

        let mut url = endpoint.clone();
        url.query_pairs_mut().append_pair("token", token);

        let (ws, _) = connect_async(url.as_str()).await?;
        let (mut sink, mut stream) = ws.split();

        let (state_tx, state_rx) = watch::channel(ChannelState::Open);
        let state_tx = Arc::new(state_tx);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(64);
        let handler: Arc<RwLock<Option<MessageHandler>>> = Arc::new(RwLock::new(None));
        let cancel = CancellationToken::new();

        // Writer: drains the outbound queue into the socket. On teardown it
        // sends a close frame before exiting.
        let writer_state = state_tx.clone();
        let writer_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = writer_cancel.cancelled() => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                    frame = outbound_rx.recv() => {
                        let Some(frame) = frame else { break };
                        if let Err(err) = sink.send(frame).await {
                            tracing::warn!(error = %err, "realtime send failed; closing channel");
                            break;
                        }
                    }
                }
            }
            let _ = writer_state.send(ChannelState::Closed);
        });

        // Reader: parses inbound frames and dispatches application
        // payloads to the current handler.
        let reader_state = state_tx.clone();
        let reader_cancel = cancel.clone();
        let reader_handler = handler.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = reader_cancel.cancelled() => break,
                    frame = stream.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => dispatch(&reader_handler, &text),
                            Some(Ok(Message::Close(_))) => {
                                tracing::debug!("realtime peer closed the connection");
                                break;
                            }
                            // Binary and protocol-level ping/pong frames are
                            // not part of the application contract.
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                tracing::warn!(error = %err, "realtime receive failed");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }
            let _ = reader_state.send(ChannelState::Closed);
        });

        // Heartbeat: keep-alive pings while the connection stays open.
        let heartbeat_cancel = cancel.clone();
        let heartbeat_tx = outbound_tx.clone();
        let mut heartbeat_state = state_rx.clone();
        let period = options.heartbeat_interval;
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                tokio::select! {
                    () = heartbeat_cancel.cancelled() => break,
                    changed = heartbeat_state.changed() => {
                        if changed.is_err() || *heartbeat_state.borrow() != ChannelState::Open {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if *heartbeat_state.borrow() != ChannelState::Open {
                            break;
                        }
                        let ping = Message::Text(r#"{"type":"ping"}"#.to_string());
                        if heartbeat_tx.send(ping).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            state: state_rx,
            outbound: outbound_tx,
            handler,
            cancel,
        })
    }

    /// Replace the inbound-message handler. Takes effect for the next
    /// frame; the connection is untouched.
    pub fn set_handler(&self, callback: impl Fn(Value) + Send + Sync + 'static) {
        if let Ok(mut guard) = self.handler.write() {
            *guard = Some(Box::new(callback));
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Whether the connection is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Watch lifecycle transitions, e.g. to learn when the connection
    /// closed and a new channel is needed.
    #[must_use]
    pub fn state_watch(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// A clonable outbound handle tied to this connection.
    #[must_use]
    pub fn sender(&self) -> ChannelSender {
        ChannelSender {
            state: self.state.clone(),
            outbound: self.outbound.clone(),
        }
    }

    /// Best-effort, non-blocking send of a JSON value. Dropped with
    /// [`ChannelError::NotConnected`] when the channel is not open.
    pub fn send(&self, value: &Value) -> Result<(), ChannelError> {
        self.sender().send_json(value)
    }

    /// Tear the connection down: stops the heartbeat and both socket
    /// pumps. Idempotent — closing an already closed channel is a no-op.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Parse one inbound text frame and hand application payloads to the
/// handler. Heartbeat acknowledgments and unparsable frames are expected
/// noise, not protocol errors.
fn dispatch(handler: &Arc<RwLock<Option<MessageHandler>>>, raw: &str) {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        tracing::debug!("ignoring non-JSON realtime frame");
        return;
    };
    if matches!(
        value.get("type").and_then(Value::as_str),
        Some("ping" | "pong")
    ) {
        return;
    }
    if let Ok(guard) = handler.read() {
        if let Some(callback) = guard.as_ref() {
            callback(value);
        }
    }
}
