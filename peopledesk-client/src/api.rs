//! Typed endpoint surface over [`ApiClient::call`].

use reqwest::Method;
use shared::models::{
    AuthenticatedUser, ChatMessage, ConversationSummary, LoginRequest, LoginResponse,
    MarkReadResponse, NotificationCounts,
};

use crate::credentials::{AuthEvent, Session};
use crate::error::ApiError;
use crate::transport::{ApiClient, CallOptions};

impl ApiClient {
    /// Authenticate and store the resulting session in the credential
    /// store.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthenticatedUser, ApiError> {
        let url = self.endpoint("auth/login")?;
        let payload = self
            .call(
                Method::POST,
                url,
                CallOptions::new().with_body(serde_json::to_value(request)?),
            )
            .await?;
        let response: LoginResponse = payload.decode()?;
        self.credentials().store(Session {
            token: response.token,
            user: response.user.clone(),
        });
        Ok(response.user)
    }

    /// Terminate the session server-side, then clear the local credential
    /// regardless of the outcome. A 401 here is a benign race with an
    /// already dead session, not a failure.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let url = self.logout_endpoint().clone();
        let result = self.call(Method::POST, url, CallOptions::new()).await;

        if self.credentials().clear().is_some() {
            self.credentials().publish(AuthEvent::LoggedOut);
        }

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.is_unauthorized() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Re-validate the stored credential. A 401 is delivered to the caller
    /// as an ordinary HTTP error rather than handled globally; the session
    /// monitor owns that decision. The response body is ignored.
    pub async fn session_status(&self) -> Result<(), ApiError> {
        let url = self.endpoint("auth/session")?;
        self.call(Method::GET, url, CallOptions::handle_unauthorized_locally())
            .await?;
        Ok(())
    }

    /// The authenticated user's profile.
    pub async fn profile(&self) -> Result<AuthenticatedUser, ApiError> {
        let url = self.endpoint("auth/me")?;
        self.call(Method::GET, url, CallOptions::new())
            .await?
            .decode()
    }

    /// The sidebar listing of the local user's conversations, most recent
    /// first.
    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        let url = self.endpoint("messages/conversations")?;
        self.call(Method::GET, url, CallOptions::new())
            .await?
            .decode()
    }

    /// Chronological message history with one counterpart.
    pub async fn history(&self, other_user_id: i64) -> Result<Vec<ChatMessage>, ApiError> {
        let url = self.endpoint(&format!("messages/history/{other_user_id}"))?;
        self.call(Method::GET, url, CallOptions::new())
            .await?
            .decode()
    }

    /// Mark every message from the counterpart as read; returns how many
    /// messages were affected.
    pub async fn mark_read(&self, other_user_id: i64) -> Result<MarkReadResponse, ApiError> {
        let url = self.endpoint(&format!("messages/read/{other_user_id}"))?;
        self.call(Method::PUT, url, CallOptions::new())
            .await?
            .decode()
    }

    /// Unread notification counters for every category.
    pub async fn notification_counts(&self) -> Result<NotificationCounts, ApiError> {
        let url = self.endpoint("notifications/counts")?;
        self.call(Method::GET, url, CallOptions::new())
            .await?
            .decode()
    }

    /// Reset every notification counter server-side.
    pub async fn mark_notifications_read(&self) -> Result<(), ApiError> {
        let url = self.endpoint("notifications/read")?;
        self.call(Method::PUT, url, CallOptions::new()).await?;
        Ok(())
    }
}
