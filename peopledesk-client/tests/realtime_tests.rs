//! Integration tests for the realtime channel, against an in-process axum
//! WebSocket fixture. Heartbeat intervals are shortened so the tests
//! finish quickly.

use std::time::Duration;

use axum::Router;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{RawQuery, State};
use axum::response::IntoResponse;
use axum::routing::get;
use chrono::{TimeZone, Utc};
use client::{ChannelError, ChannelOptions, ChannelState, RealtimeChannel};
use serde_json::{Value, json};
use shared::models::{ChatMessage, Timestamp};
use tokio::sync::{broadcast, mpsc};
use url::Url;

const CLOSE_SENTINEL: &str = "__close__";

#[derive(Debug)]
enum ServerEvent {
    Connected { query: String },
    Frame(String),
    Closed,
}

#[derive(Clone)]
struct ServerState {
    events: mpsc::UnboundedSender<ServerEvent>,
    push: broadcast::Sender<String>,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    RawQuery(query): RawQuery,
    State(state): State<ServerState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_socket(socket, query.unwrap_or_default(), state))
}

async fn serve_socket(mut socket: WebSocket, query: String, state: ServerState) {
    // Subscribe before announcing the connection so a frame pushed right
    // after the Connected event is never lost.
    let mut push = state.push.subscribe();
    let _ = state.events.send(ServerEvent::Connected { query });
    loop {
        tokio::select! {
            frame = socket.recv() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        let _ = state.events.send(ServerEvent::Frame(text.as_str().to_owned()));
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        let _ = state.events.send(ServerEvent::Closed);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => {
                        let _ = state.events.send(ServerEvent::Closed);
                        break;
                    }
                }
            }
            pushed = push.recv() => {
                let Ok(text) = pushed else { break };
                // Sentinel for tests that need a server-initiated close.
                if text == CLOSE_SENTINEL {
                    let _ = socket.send(WsMessage::Close(None)).await;
                    break;
                }
                if socket.send(WsMessage::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

struct Fixture {
    endpoint: Url,
    events: mpsc::UnboundedReceiver<ServerEvent>,
    push: broadcast::Sender<String>,
}

impl Fixture {
    async fn next_event(&mut self) -> ServerEvent {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("timed out waiting for a server event")
            .expect("fixture channel closed")
    }

    /// Assert no further events arrive within the window.
    async fn assert_quiet(&mut self, window: Duration) {
        if let Ok(event) = tokio::time::timeout(window, self.events.recv()).await {
            panic!("expected silence, got {event:?}");
        }
    }

    fn push(&self, frame: &str) {
        self.push
            .send(frame.to_string())
            .expect("no connected socket to push to");
    }
}

async fn spawn_ws_server() -> Fixture {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (push_tx, _) = broadcast::channel(32);
    let state = ServerState {
        events: events_tx,
        push: push_tx.clone(),
    };
    let router = Router::new().route("/ws", get(ws_handler)).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Fixture {
        endpoint: Url::parse(&format!("ws://{addr}/ws")).unwrap(),
        events: events_rx,
        push: push_tx,
    }
}

fn fast_heartbeat(ms: u64) -> ChannelOptions {
    ChannelOptions {
        heartbeat_interval: Duration::from_millis(ms),
    }
}

/// Slow enough to never fire inside a test.
fn idle_heartbeat() -> ChannelOptions {
    fast_heartbeat(60_000)
}

async fn wait_for_closed(channel: &RealtimeChannel) {
    let mut watch = channel.state_watch();
    loop {
        if *watch.borrow() == ChannelState::Closed {
            return;
        }
        match tokio::time::timeout(Duration::from_secs(2), watch.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                assert_eq!(*watch.borrow(), ChannelState::Closed);
                return;
            }
            Err(_) => panic!("timed out waiting for the channel to close"),
        }
    }
}

#[tokio::test]
async fn test_connects_with_token_query() {
    let mut fixture = spawn_ws_server().await;

    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", idle_heartbeat())
        .await
        .unwrap();

    match fixture.next_event().await {
        ServerEvent::Connected { query } => assert_eq!(query, "token=secret"),
        other => panic!("expected a connection, got {other:?}"),
    }
    assert!(channel.is_open());

    channel.close();
}

#[tokio::test]
async fn test_heartbeat_pings_while_open_and_stops_after_close() {
    let mut fixture = spawn_ws_server().await;
    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", fast_heartbeat(50))
        .await
        .unwrap();
    fixture.next_event().await; // connected

    for _ in 0..3 {
        match fixture.next_event().await {
            ServerEvent::Frame(frame) => {
                assert_eq!(
                    serde_json::from_str::<Value>(&frame).unwrap(),
                    json!({ "type": "ping" })
                );
            }
            other => panic!("expected a ping frame, got {other:?}"),
        }
    }

    channel.close();
    wait_for_closed(&channel).await;

    // Drain until the close is observed, then require silence: zero pings
    // once closed.
    loop {
        match fixture.next_event().await {
            ServerEvent::Closed => break,
            ServerEvent::Frame(_) => {} // a ping already in flight
            other => panic!("unexpected event {other:?}"),
        }
    }
    fixture.assert_quiet(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_inbound_ping_is_swallowed_and_messages_dispatch() {
    let mut fixture = spawn_ws_server().await;
    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", idle_heartbeat())
        .await
        .unwrap();
    fixture.next_event().await; // connected

    let (delivered_tx, mut delivered) = mpsc::unbounded_channel::<Value>();
    channel.set_handler(move |value| {
        let _ = delivered_tx.send(value);
    });

    fixture.push(r#"{"type":"ping"}"#);
    fixture.push(r#"{"senderId":12,"receiverId":7,"content":"Morning!","timestamp":"2026-01-12T09:14:00Z"}"#);

    // Frames arrive in order on one socket, so receiving only the chat
    // message proves the ping was swallowed.
    let value = tokio::time::timeout(Duration::from_secs(2), delivered.recv())
        .await
        .expect("handler was never invoked")
        .unwrap();
    assert_eq!(value.get("senderId"), Some(&json!(12)));
    assert!(delivered.try_recv().is_err());

    channel.close();
}

#[tokio::test]
async fn test_non_json_frames_are_ignored() {
    let mut fixture = spawn_ws_server().await;
    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", idle_heartbeat())
        .await
        .unwrap();
    fixture.next_event().await; // connected

    let (delivered_tx, mut delivered) = mpsc::unbounded_channel::<Value>();
    channel.set_handler(move |value| {
        let _ = delivered_tx.send(value);
    });

    fixture.push("plain text ack");
    fixture.push(r#"{"kind":"noteworthy"}"#);

    let value = tokio::time::timeout(Duration::from_secs(2), delivered.recv())
        .await
        .expect("handler was never invoked")
        .unwrap();
    assert_eq!(value, json!({ "kind": "noteworthy" }));
    assert!(delivered.try_recv().is_err());

    channel.close();
}

#[tokio::test]
async fn test_handler_replacement_keeps_the_connection() {
    let mut fixture = spawn_ws_server().await;
    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", idle_heartbeat())
        .await
        .unwrap();
    fixture.next_event().await; // connected

    let (first_tx, mut first) = mpsc::unbounded_channel::<Value>();
    channel.set_handler(move |value| {
        let _ = first_tx.send(value);
    });
    fixture.push(r#"{"seq":1}"#);
    let value = tokio::time::timeout(Duration::from_secs(2), first.recv())
        .await
        .expect("first handler missed its frame")
        .unwrap();
    assert_eq!(value, json!({ "seq": 1 }));

    let (second_tx, mut second) = mpsc::unbounded_channel::<Value>();
    channel.set_handler(move |value| {
        let _ = second_tx.send(value);
    });
    fixture.push(r#"{"seq":2}"#);
    let value = tokio::time::timeout(Duration::from_secs(2), second.recv())
        .await
        .expect("second handler missed its frame")
        .unwrap();
    assert_eq!(value, json!({ "seq": 2 }));

    // The swap never touched the connection: the replaced handler saw one
    // frame and the socket stayed open throughout.
    assert!(first.try_recv().is_err());
    assert!(channel.is_open());

    channel.close();
}

#[tokio::test]
async fn test_send_reaches_the_server() {
    let mut fixture = spawn_ws_server().await;
    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", idle_heartbeat())
        .await
        .unwrap();
    fixture.next_event().await; // connected

    channel
        .send(&json!({ "senderId": 7, "receiverId": 12, "content": "hi" }))
        .unwrap();

    match fixture.next_event().await {
        ServerEvent::Frame(frame) => {
            let value: Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(value.get("content"), Some(&json!("hi")));
        }
        other => panic!("expected the sent frame, got {other:?}"),
    }

    channel.close();
}

#[tokio::test]
async fn test_sender_encodes_chat_messages() {
    let mut fixture = spawn_ws_server().await;
    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", idle_heartbeat())
        .await
        .unwrap();
    fixture.next_event().await; // connected

    let sender = channel.sender();
    let message = ChatMessage {
        id: None,
        sender_id: 7,
        receiver_id: 12,
        content: "See you at standup".to_string(),
        timestamp: Timestamp(Utc.with_ymd_and_hms(2026, 1, 12, 9, 15, 0).unwrap()),
    };
    sender.send_message(&message).unwrap();

    match fixture.next_event().await {
        ServerEvent::Frame(frame) => {
            let echoed: ChatMessage = serde_json::from_str(&frame).unwrap();
            assert!(echoed.same_payload(&message));
        }
        other => panic!("expected the sent frame, got {other:?}"),
    }

    channel.close();
}

#[tokio::test]
async fn test_send_after_close_reports_not_connected() {
    let mut fixture = spawn_ws_server().await;
    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", idle_heartbeat())
        .await
        .unwrap();
    fixture.next_event().await; // connected

    channel.close();
    wait_for_closed(&channel).await;

    let result = channel.send(&json!({ "content": "too late" }));
    assert!(matches!(result, Err(ChannelError::NotConnected)));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let mut fixture = spawn_ws_server().await;
    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", fast_heartbeat(50))
        .await
        .unwrap();
    fixture.next_event().await; // connected

    channel.close();
    channel.close();
    wait_for_closed(&channel).await;
    channel.close();

    assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test]
async fn test_remote_close_is_terminal() {
    let mut fixture = spawn_ws_server().await;
    let channel = RealtimeChannel::connect(&fixture.endpoint, "secret", idle_heartbeat())
        .await
        .unwrap();
    fixture.next_event().await; // connected

    fixture.push(CLOSE_SENTINEL);
    wait_for_closed(&channel).await;

    // Closed is terminal: no reconnect happens, sends keep failing until
    // the owner constructs a new channel.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(channel.state(), ChannelState::Closed);
    assert!(matches!(
        channel.send(&json!({ "content": "nope" })),
        Err(ChannelError::NotConnected)
    ));
}
