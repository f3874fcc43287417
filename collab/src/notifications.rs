//! Background notification poller.
//!
//! Fetches the session user's notification feed on a fixed interval and
//! publishes it as [`NetEvent::Notifications`]. A failed fetch is logged and
//! nothing is published, so the UI keeps showing the previous feed.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use collab_proto::models::Notification;

use crate::api::{ApiClient, ApiError};
use crate::net::NetEvent;

/// A fetched notification list, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFeed {
    /// Notifications as returned by the server.
    pub items: Vec<Notification>,
}

impl NotificationFeed {
    /// Number of unread notifications.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    /// Whether anything is unread.
    #[must_use]
    pub fn has_unread(&self) -> bool {
        self.items.iter().any(|n| !n.is_read)
    }

    /// Marks `id` read locally. Returns `false` if it is not in the feed.
    pub fn mark_read(&mut self, id: u64) -> bool {
        self.items
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| n.is_read = true)
            .is_some()
    }
}

/// Spawns the poller. It runs until `events` is closed or the handle is
/// aborted.
pub fn spawn_poller(
    api: ApiClient,
    every: Duration,
    events: mpsc::Sender<NetEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let event = match api.notifications().await {
                Ok(items) => NetEvent::Notifications(NotificationFeed { items }),
                Err(ApiError::Unauthorized) => NetEvent::Unauthorized,
                Err(e) => {
                    tracing::warn!(err = %e, "notification poll failed");
                    continue;
                }
            };
            if events.send(event).await.is_err() {
                break;
            }
        }
        tracing::debug!("notification poller stopped");
    })
}
