#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use client::{ApiClient, CredentialStore, Session};
use shared::config::Config;
use shared::models::{AuthenticatedUser, UserRole};
use url::Url;

/// Bind the router to an ephemeral port and serve it for the rest of the
/// test.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub fn config_for(addr: SocketAddr) -> Config {
    let mut config = Config::with_defaults();
    config.api_base_url = Url::parse(&format!("http://{addr}/api/")).unwrap();
    config.realtime_url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
    config
}

pub fn test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: 7,
        username: "amara.okafor".to_string(),
        email: "amara@example.com".to_string(),
        role: UserRole::Manager,
    }
}

/// A client holding a stored session for user 7.
pub fn authenticated_client(addr: SocketAddr) -> (ApiClient, CredentialStore) {
    let credentials = CredentialStore::new();
    credentials.store(Session {
        token: "secret-token".to_string(),
        user: test_user(),
    });
    let client = ApiClient::new(&config_for(addr), credentials.clone()).unwrap();
    (client, credentials)
}

/// A client with no stored session.
pub fn anonymous_client(addr: SocketAddr) -> ApiClient {
    ApiClient::new(&config_for(addr), CredentialStore::new()).unwrap()
}
