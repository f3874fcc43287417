//! JSON frames exchanged over the per-partner chat WebSocket.
//!
//! Control frames carry a `type` discriminator. Plain chat messages are sent
//! by the client without one; the server tags them `new_message` on the way
//! back, and decoders accept either shape (see [`crate::codec`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{MessageId, UserId};

/// A chat message typed by the session user, as sent to the server.
///
/// `sender_id` and `receiver_id` are informational: the server derives both
/// from the authenticated connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Message text.
    pub message: String,
    /// Session user.
    pub sender_id: UserId,
    /// Selected partner.
    pub receiver_id: UserId,
}

/// Control frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlFrame {
    /// The session user started typing.
    TypingStart {
        /// Session user.
        sender_id: UserId,
        /// Selected partner.
        receiver_id: UserId,
    },
    /// The session user stopped typing.
    TypingStop {
        /// Session user.
        sender_id: UserId,
        /// Selected partner.
        receiver_id: UserId,
    },
    /// Replace the text of one of the session user's messages.
    EditMessage {
        /// Message to edit.
        message_id: MessageId,
        /// Replacement text.
        new_message: String,
    },
    /// Soft-delete one of the session user's messages.
    DeleteMessage {
        /// Message to delete.
        message_id: MessageId,
    },
}

/// Anything the client may put on the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientFrame {
    /// A tagged control frame.
    Control(ControlFrame),
    /// An untagged plain chat message.
    Message(OutgoingMessage),
}

/// A chat message delivered by the server to the other room member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Stored message id. Older servers omit it.
    #[serde(default)]
    pub id: Option<MessageId>,
    /// Author.
    pub sender_id: UserId,
    /// Author display name.
    pub sender_username: String,
    /// Message text.
    pub message: String,
}

/// Frames pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// The partner started typing.
    TypingStart {
        /// Who is typing.
        sender_username: String,
    },
    /// The partner stopped typing.
    TypingStop {
        /// Who stopped typing.
        sender_username: String,
    },
    /// A message's text was replaced.
    MessageEdited {
        /// Edited message.
        message_id: MessageId,
        /// New text.
        new_message: String,
        /// Time of the edit.
        edited_at: DateTime<Utc>,
    },
    /// A message was soft-deleted.
    MessageDeleted {
        /// Deleted message.
        message_id: MessageId,
    },
    /// A room member connected.
    UserOnline {
        /// The member.
        user_id: UserId,
    },
    /// A room member disconnected.
    UserOffline {
        /// The member.
        user_id: UserId,
    },
    /// A chat message from the other room member.
    NewMessage(IncomingMessage),
}

impl ServerFrame {
    /// Every `type` value with a dedicated variant.
    pub const TAGS: [&'static str; 7] = [
        "typing_start",
        "typing_stop",
        "message_edited",
        "message_deleted",
        "user_online",
        "user_offline",
        "new_message",
    ];

    /// The `type` value this frame serializes with.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::TypingStart { .. } => "typing_start",
            Self::TypingStop { .. } => "typing_stop",
            Self::MessageEdited { .. } => "message_edited",
            Self::MessageDeleted { .. } => "message_deleted",
            Self::UserOnline { .. } => "user_online",
            Self::UserOffline { .. } => "user_offline",
            Self::NewMessage(_) => "new_message",
        }
    }
}
