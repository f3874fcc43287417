//! Identifiers and REST payload types shared by the chat server and client.
//!
//! Ids are the integer primary keys handed out by the server. They serialize
//! as bare JSON numbers so payloads stay compatible with the web frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies a marketplace user (brand or creator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wraps a raw user id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Identifies a stored chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Wraps a raw message id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user the session user can chat with, as returned by `GET /chat/users/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPartner {
    /// The partner's user id.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Whether the partner currently has an open chat connection.
    #[serde(default)]
    pub is_online: bool,
}

/// One stored message, as returned by `GET /chat/history/{user_id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Message id.
    pub id: MessageId,
    /// Author of the message.
    pub sender_id: UserId,
    /// Author display name.
    pub sender_username: String,
    /// Recipient of the message.
    pub receiver_id: UserId,
    /// Recipient display name.
    pub receiver_username: String,
    /// Message text. Empty for deleted messages.
    pub message: String,
    /// Whether the requesting user wrote this message.
    #[serde(rename = "self")]
    pub is_self: bool,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Time of the last edit, if any.
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    /// Whether the message was soft-deleted.
    #[serde(default)]
    pub is_deleted: bool,
}

/// Structured payload attached to a notification.
///
/// The `type` tag tells the client which action a notification links to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationData {
    /// A new chat message arrived while the recipient was away.
    ChatMessage {
        /// Author of the message.
        sender_id: UserId,
    },
    /// A brand invited a creator to a project.
    CollaborationInvite {
        /// Project the invite is for.
        project_id: u64,
        /// Inviting brand.
        brand_id: u64,
    },
    /// A dispute was opened on a collaboration.
    Dispute {
        /// The dispute record.
        dispute_id: u64,
    },
    /// Any other notification linked to a collaboration.
    Collaboration {
        /// The collaboration record.
        collaboration_id: u64,
    },
}

/// An entry of `GET /api/notifications/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification id.
    pub id: u64,
    /// Human-readable text.
    pub message: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the recipient has read it.
    #[serde(default)]
    pub is_read: bool,
    /// Optional structured payload.
    #[serde(default)]
    pub data: Option<NotificationData>,
}
