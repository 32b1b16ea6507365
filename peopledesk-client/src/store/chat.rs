use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use shared::models::ChatMessage;
use thiserror::Error;

use crate::realtime::ChannelError;

/// Failures surfaced by [`ChatStore::send`]. Sent messages are handed to
/// the realtime channel and never appended locally, so a failure here means
/// the message went nowhere — callers get to say so instead of losing it
/// silently.
#[derive(Debug, Error)]
pub enum ChatSendError {
    /// No realtime sender has been registered yet.
    #[error("no realtime sender registered; message dropped")]
    NotWired,

    /// The realtime channel refused the message.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// The realtime-send function wired in by the owner of the channel.
pub type OutboundSender = Box<dyn Fn(&ChatMessage) -> Result<(), ChannelError> + Send + Sync>;

/// Process-wide store of per-conversation message lists.
///
/// A conversation is keyed by the counterpart's user id — the participant
/// that is not the locally authenticated user. The store is the single
/// owner of the lists: pages read copies through [`ChatStore::conversation`]
/// and never mutate them directly. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct ChatStore {
    inner: Arc<ChatStoreInner>,
}

#[derive(Default)]
struct ChatStoreInner {
    local_user: RwLock<Option<i64>>,
    conversations: Mutex<HashMap<i64, Vec<ChatMessage>>>,
    outbound: RwLock<Option<OutboundSender>>,
}

impl ChatStore {
    /// Create an empty store with no local user identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record which user the message lists are seen from. Conversation
    /// keying needs this before [`ChatStore::add_message`] can file
    /// anything.
    pub fn set_local_user(&self, id: i64) {
        if let Ok(mut guard) = self.inner.local_user.write() {
            *guard = Some(id);
        }
    }

    /// The locally authenticated user id, when known.
    #[must_use]
    pub fn local_user(&self) -> Option<i64> {
        self.inner.local_user.read().ok().and_then(|guard| *guard)
    }

    /// Empty every conversation's message list. Called when switching the
    /// active conversation so stale rows never show while the new history
    /// loads.
    pub fn clear(&self) {
        if let Ok(mut conversations) = self.inner.conversations.lock() {
            conversations.clear();
        }
    }

    /// File a message under its conversation, unless an identical one
    /// (same sender, receiver, content, and timestamp) is already there.
    ///
    /// The guard covers the same message arriving once from a history
    /// fetch and again from the realtime push, or being delivered twice by
    /// the channel. Without a local user identity the message cannot be
    /// keyed and is dropped with a diagnostic.
    pub fn add_message(&self, message: ChatMessage) {
        let Some(local) = self.local_user() else {
            tracing::warn!("dropping inbound message: local user identity is not set");
            return;
        };
        let key = message.counterpart(local);

        let Ok(mut conversations) = self.inner.conversations.lock() else {
            return;
        };
        let list = conversations.entry(key).or_default();
        if list.iter().any(|existing| existing.same_payload(&message)) {
            tracing::debug!(conversation = key, "skipping duplicate message");
            return;
        }
        list.push(message);
    }

    /// A copy of the message list for one counterpart, in insertion order.
    #[must_use]
    pub fn conversation(&self, other_user_id: i64) -> Vec<ChatMessage> {
        self.inner
            .conversations
            .lock()
            .ok()
            .and_then(|conversations| conversations.get(&other_user_id).cloned())
            .unwrap_or_default()
    }

    /// Wire in the realtime-send function. Called once after the channel
    /// is established; a later call replaces the previous sender.
    pub fn register_sender(
        &self,
        sender: impl Fn(&ChatMessage) -> Result<(), ChannelError> + Send + Sync + 'static,
    ) {
        if let Ok(mut guard) = self.inner.outbound.write() {
            *guard = Some(Box::new(sender));
        }
    }

    /// Hand a message to the realtime channel. The local list is not
    /// touched — the message re-arrives through the inbound path like any
    /// other and is appended there (no optimistic echo).
    pub fn send(&self, message: &ChatMessage) -> Result<(), ChatSendError> {
        let Ok(guard) = self.inner.outbound.read() else {
            return Err(ChatSendError::NotWired);
        };
        match guard.as_ref() {
            Some(sender) => Ok(sender(message)?),
            None => Err(ChatSendError::NotWired),
        }
    }
}
