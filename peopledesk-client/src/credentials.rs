use std::sync::{Arc, RwLock};

use shared::models::AuthenticatedUser;
use tokio::sync::broadcast;

/// How the stored credential went away. Consumers (the page layer) decide
/// what each flavor looks like on screen; this crate only reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The transport saw a 401 mid-request and cleared the session. The
    /// source behavior is a blocking alert followed by navigation to login.
    ForcedLogout,
    /// The session monitor found the credential invalid on a poll. The
    /// source behavior is a non-blocking warning followed by navigation.
    SessionExpired,
    /// The user signed out on purpose.
    LoggedOut,
}

/// One authenticated session: the bearer token plus the cached user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The opaque bearer token.
    pub token: String,
    /// The profile cached at login time.
    pub user: AuthenticatedUser,
}

/// Process-wide owner of the active credential and cached user.
///
/// Cheap to clone; clones share state. At most one session is held at a
/// time, and [`CredentialStore::clear`] hands the session to exactly one of
/// any set of racing callers, so logout side effects (alerting, navigation)
/// run once.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for CredentialStore {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            session: Arc::new(RwLock::new(None)),
            events,
        }
    }
}

impl CredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored session with a freshly authenticated one.
    pub fn store(&self, session: Session) {
        if let Ok(mut guard) = self.session.write() {
            *guard = Some(session);
        }
    }

    /// The bearer token, when a session is active.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|session| session.token.clone()))
    }

    /// The cached user, when a session is active.
    #[must_use]
    pub fn user(&self) -> Option<AuthenticatedUser> {
        self.session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|session| session.user.clone()))
    }

    /// The locally authenticated user's id, when a session is active.
    #[must_use]
    pub fn local_user_id(&self) -> Option<i64> {
        self.session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|session| session.user.id))
    }

    /// Whether a session is currently stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Take the session out of the store.
    ///
    /// Returns `Some` for exactly one of any set of racing callers; that
    /// caller owns the logout side effects.
    pub fn clear(&self) -> Option<Session> {
        self.session.write().ok().and_then(|mut guard| guard.take())
    }

    /// Subscribe to credential lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Publish a credential lifecycle event to subscribers.
    pub fn publish(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }
}
