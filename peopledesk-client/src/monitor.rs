use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shared::config::client::DEFAULT_SESSION_POLL_INTERVAL_MS;

use crate::credentials::AuthEvent;
use crate::transport::ApiClient;

/// Construction knobs for [`SessionMonitor::spawn`].
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Whether to arm the polling loop at all. A disarmed monitor holds no
    /// timer and performs no requests.
    pub enabled: bool,
    /// Cadence of the validation checks.
    pub poll_interval: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: Duration::from_millis(DEFAULT_SESSION_POLL_INTERVAL_MS),
        }
    }
}

/// Periodically re-validates the stored credential against the backend.
///
/// Each tick asks the session-status endpoint with the global 401 handling
/// turned off; the monitor decides itself:
///
/// - success: the session is still valid, nothing happens;
/// - 401: if a credential is still present (another path may already have
///   signed out), it is cleared and [`AuthEvent::SessionExpired`] is
///   published;
/// - anything else: logged and ignored — a transient failure is not
///   evidence the session is gone.
///
/// The loop stops when [`SessionMonitor::shutdown`] is called or the
/// monitor is dropped; no tick runs after that.
#[derive(Debug)]
pub struct SessionMonitor {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionMonitor {
    /// Arm the monitor. With `enabled: false` no timer is started and the
    /// returned monitor is inert.
    #[must_use]
    pub fn spawn(client: ApiClient, options: MonitorOptions) -> Self {
        let cancel = CancellationToken::new();
        if !options.enabled {
            return Self { cancel, task: None };
        }

        let token = cancel.clone();
        let period = options.poll_interval;
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => check_session(&client).await,
                }
            }
        });

        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Whether the polling loop is currently armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.task.is_some() && !self.cancel.is_cancelled()
    }

    /// Stop polling. Synchronous and idempotent; calling it twice, or on a
    /// monitor that was never armed, is fine.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn check_session(client: &ApiClient) {
    match client.session_status().await {
        Ok(()) => {}
        Err(err) if err.is_unauthorized() => {
            // The guard avoids a redundant event when the transport's own
            // 401 path, or an explicit logout, got there first.
            if client.credentials().clear().is_some() {
                tracing::warn!("stored session is no longer valid; signing out");
                client.credentials().publish(AuthEvent::SessionExpired);
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "session check failed; leaving session in place");
        }
    }
}
