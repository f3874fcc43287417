//! In-memory per-user notification feed.
//!
//! Each user has an independent queue capped at a configurable maximum; when
//! the cap is exceeded the oldest notification is dropped. Notifications are
//! listed newest first.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use collab_proto::models::{Notification, NotificationData, UserId};

/// Default maximum number of notifications kept per user.
const DEFAULT_MAX_NOTIFICATIONS: usize = 200;

/// Thread-safe notification feed.
pub struct NotificationStore {
    feeds: RwLock<HashMap<UserId, VecDeque<Notification>>>,
    next_id: AtomicU64,
    max_per_user: usize,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    /// Creates an empty store with the default per-user cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_per_user(DEFAULT_MAX_NOTIFICATIONS)
    }

    /// Creates an empty store with a custom per-user cap.
    #[must_use]
    pub fn with_max_per_user(max_per_user: usize) -> Self {
        Self {
            feeds: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            max_per_user,
        }
    }

    /// Records a notification for `recipient`, returning the feed length.
    pub async fn push(
        &self,
        recipient: UserId,
        message: impl Into<String>,
        data: Option<NotificationData>,
    ) -> usize {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            created_at: Utc::now(),
            is_read: false,
            data,
        };

        let mut feeds = self.feeds.write().await;
        let feed = feeds.entry(recipient).or_default();
        feed.push_back(notification);
        if feed.len() > self.max_per_user {
            feed.pop_front();
        }
        let len = feed.len();
        drop(feeds);
        len
    }

    /// Lists `recipient`'s notifications, newest first.
    pub async fn list(&self, recipient: UserId) -> Vec<Notification> {
        let feeds = self.feeds.read().await;
        feeds
            .get(&recipient)
            .map(|feed| feed.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Marks one of `recipient`'s notifications read. Returns `false` if it
    /// does not exist.
    pub async fn mark_read(&self, recipient: UserId, id: u64) -> bool {
        let mut feeds = self.feeds.write().await;
        feeds
            .get_mut(&recipient)
            .and_then(|feed| feed.iter_mut().find(|n| n.id == id))
            .map(|n| n.is_read = true)
            .is_some()
    }
}
