//! Per-pair chat rooms and group broadcast.
//!
//! Every socket joins the room named after the unordered pair of users it
//! connects (`chat_{min}_{max}`). Frames are broadcast to the members of one
//! room, optionally skipping the user who caused them.
//!
//! Rooms are ephemeral: they exist while at least one socket is joined.

use std::collections::HashMap;

use axum::extract::ws::Message;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use collab_proto::codec;
use collab_proto::frame::ServerFrame;
use collab_proto::models::UserId;

/// Identifies the room shared by two users, independent of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomKey {
    low: UserId,
    high: UserId,
}

impl RoomKey {
    /// The room shared by `a` and `b`.
    #[must_use]
    pub fn new(a: UserId, b: UserId) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    /// Returns whether `user` is one of the pair.
    #[must_use]
    pub fn includes(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// Returns whether a message between `sender` and `receiver` belongs here.
    #[must_use]
    pub fn covers(&self, sender: UserId, receiver: UserId) -> bool {
        Self::new(sender, receiver) == *self
    }
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chat_{}_{}", self.low, self.high)
    }
}

/// Unique id of one open socket.
pub type ConnId = Uuid;

/// A socket joined to a room.
#[derive(Debug, Clone)]
pub struct Member {
    /// The authenticated user behind the socket.
    pub user_id: UserId,
    /// Channel feeding the socket's writer task.
    pub sender: mpsc::UnboundedSender<Message>,
}

/// All open rooms and their members.
pub struct RoomHub {
    rooms: RwLock<HashMap<RoomKey, HashMap<ConnId, Member>>>,
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a socket to a room.
    pub async fn join(&self, key: RoomKey, conn_id: ConnId, member: Member) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(key).or_default().insert(conn_id, member);
    }

    /// Removes a socket from a room, dropping the room when it empties.
    pub async fn leave(&self, key: RoomKey, conn_id: ConnId) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(&key) {
            members.remove(&conn_id);
            if members.is_empty() {
                rooms.remove(&key);
            }
        }
    }

    /// Returns whether `user` has a socket open in the room.
    pub async fn has_member(&self, key: RoomKey, user: UserId) -> bool {
        let rooms = self.rooms.read().await;
        rooms
            .get(&key)
            .is_some_and(|members| members.values().any(|m| m.user_id == user))
    }

    /// Number of sockets joined to the room.
    pub async fn member_count(&self, key: RoomKey) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(&key).map_or(0, HashMap::len)
    }

    /// Sends `frame` to every socket in the room except those of `except`.
    ///
    /// Returns the number of sockets the frame was handed to. Sockets whose
    /// writer has gone away are skipped; they leave on their own.
    pub async fn broadcast(&self, key: RoomKey, frame: &ServerFrame, except: Option<UserId>) -> usize {
        let text = match codec::encode_server(frame) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(room = %key, error = %e, "failed to encode frame for broadcast");
                return 0;
            }
        };

        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(&key) else {
            return 0;
        };

        let mut delivered = 0;
        for (conn_id, member) in members {
            if except == Some(member.user_id) {
                continue;
            }
            if member.sender.send(Message::Text(text.clone().into())).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(room = %key, conn = %conn_id, "skipping closed socket");
            }
        }
        delivered
    }
}
