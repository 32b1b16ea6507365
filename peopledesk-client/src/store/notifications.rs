use std::sync::{Arc, Mutex};

use shared::models::{NotificationCategory, NotificationCounts};

use crate::error::ApiError;
use crate::transport::ApiClient;

/// Process-wide unread counters per notification category.
///
/// Cheap to clone; clones share state. Counters live only as long as the
/// process — there is no persistence across sessions.
#[derive(Debug, Clone, Default)]
pub struct NotificationStore {
    counts: Arc<Mutex<NotificationCounts>>,
}

impl NotificationStore {
    /// Create a store with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current counters.
    #[must_use]
    pub fn counts(&self) -> NotificationCounts {
        self.counts
            .lock()
            .map(|guard| *guard)
            .unwrap_or_default()
    }

    /// The current count for one category.
    #[must_use]
    pub fn count(&self, category: NotificationCategory) -> u64 {
        self.counts().get(category)
    }

    /// Unread items across all categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts().total()
    }

    /// Replace the counters wholesale with a fetched snapshot.
    pub fn apply(&self, counts: NotificationCounts) {
        if let Ok(mut guard) = self.counts.lock() {
            *guard = counts;
        }
    }

    /// Bump one category by one, e.g. when a push arrives while the
    /// category's page is not open.
    pub fn increment(&self, category: NotificationCategory) {
        if let Ok(mut guard) = self.counts.lock() {
            let slot = slot_mut(&mut guard, category);
            *slot = slot.saturating_add(1);
        }
    }

    /// Zero one category, e.g. when its page is opened.
    pub fn reset(&self, category: NotificationCategory) {
        if let Ok(mut guard) = self.counts.lock() {
            *slot_mut(&mut guard, category) = 0;
        }
    }

    /// Zero every category.
    pub fn mark_all_read(&self) {
        if let Ok(mut guard) = self.counts.lock() {
            *guard = NotificationCounts::default();
        }
    }

    /// Fetch the counters from the backend and apply them.
    pub async fn refresh(&self, client: &ApiClient) -> Result<NotificationCounts, ApiError> {
        let counts = client.notification_counts().await?;
        self.apply(counts);
        Ok(counts)
    }

    /// Reset the counters server-side, then zero the local copy.
    pub async fn sync_mark_all_read(&self, client: &ApiClient) -> Result<(), ApiError> {
        client.mark_notifications_read().await?;
        self.mark_all_read();
        Ok(())
    }
}

fn slot_mut(counts: &mut NotificationCounts, category: NotificationCategory) -> &mut u64 {
    match category {
        NotificationCategory::Messages => &mut counts.messages,
        NotificationCategory::Courses => &mut counts.courses,
        NotificationCategory::Evaluations => &mut counts.evaluations,
        NotificationCategory::Announcements => &mut counts.announcements,
    }
}
