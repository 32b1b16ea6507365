//! Integration tests for the session monitor, against an in-process axum
//! fixture. Poll intervals are shortened so the tests finish quickly.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use client::{AuthEvent, MonitorOptions, SessionMonitor};

async fn count_ok(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

fn counting_router(hits: Arc<AtomicUsize>, status: StatusCode) -> Router {
    Router::new()
        .route(
            "/api/auth/session",
            get(move |State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                status
            }),
        )
        .with_state(hits)
}

fn options(poll_ms: u64) -> MonitorOptions {
    MonitorOptions {
        enabled: true,
        poll_interval: Duration::from_millis(poll_ms),
    }
}

#[tokio::test]
async fn test_valid_session_causes_no_action() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/api/auth/session", get(count_ok))
        .with_state(hits.clone());
    let addr = common::spawn_server(router).await;

    let (client, credentials) = common::authenticated_client(addr);
    let mut events = credentials.subscribe();
    let _monitor = SessionMonitor::spawn(client, options(40));

    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(hits.load(Ordering::SeqCst) >= 2, "monitor should have polled");
    assert!(credentials.is_authenticated());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_expired_session_clears_credential_and_warns_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = counting_router(hits, StatusCode::UNAUTHORIZED);
    let addr = common::spawn_server(router).await;

    let (client, credentials) = common::authenticated_client(addr);
    let mut events = credentials.subscribe();
    let _monitor = SessionMonitor::spawn(client, options(40));

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("monitor should notice the 401")
        .unwrap();
    assert_eq!(event, AuthEvent::SessionExpired);
    assert!(!credentials.is_authenticated());

    // Later ticks find the credential already gone and stay silent.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_transient_failure_never_logs_out() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = counting_router(hits.clone(), StatusCode::INTERNAL_SERVER_ERROR);
    let addr = common::spawn_server(router).await;

    let (client, credentials) = common::authenticated_client(addr);
    let mut events = credentials.subscribe();
    let _monitor = SessionMonitor::spawn(client, options(40));

    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(hits.load(Ordering::SeqCst) >= 2, "monitor should keep polling");
    assert!(credentials.is_authenticated());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_shutdown_stops_ticks_and_is_idempotent() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = counting_router(hits.clone(), StatusCode::OK);
    let addr = common::spawn_server(router).await;

    let (client, _credentials) = common::authenticated_client(addr);
    let mut monitor = SessionMonitor::spawn(client, options(30));
    assert!(monitor.is_armed());

    tokio::time::sleep(Duration::from_millis(120)).await;
    monitor.shutdown();
    monitor.shutdown();
    assert!(!monitor.is_armed());

    // Let any request that was already in flight land before snapshotting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after_shutdown = hits.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(hits.load(Ordering::SeqCst), after_shutdown);
}

#[tokio::test]
async fn test_disabled_monitor_never_polls() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = counting_router(hits.clone(), StatusCode::OK);
    let addr = common::spawn_server(router).await;

    let (client, _credentials) = common::authenticated_client(addr);
    let monitor = SessionMonitor::spawn(
        client,
        MonitorOptions {
            enabled: false,
            poll_interval: Duration::from_millis(20),
        },
    );
    assert!(!monitor.is_armed());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
