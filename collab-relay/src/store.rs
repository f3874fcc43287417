//! In-memory chat message store.
//!
//! Messages get sequential ids and are kept in creation order, so a
//! conversation read is a filtered scan. Edits and deletes mutate in place;
//! deleted messages stay in the store with their text cleared.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use collab_proto::models::{MessageId, UserId};

use crate::rooms::RoomKey;

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Sequential id, starting at 1.
    pub id: MessageId,
    /// Author.
    pub sender_id: UserId,
    /// Recipient.
    pub receiver_id: UserId,
    /// Current text. Empty once deleted.
    pub message: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last edit.
    pub edited_at: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

/// Reasons an edit or delete is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No message has this id.
    #[error("message {0} not found")]
    NotFound(MessageId),
    /// The message belongs to a different conversation.
    #[error("message {0} is not part of this conversation")]
    WrongConversation(MessageId),
    /// Only the author may change a message.
    #[error("user {user} did not write message {id}")]
    NotAuthor {
        /// The message.
        id: MessageId,
        /// Who tried to change it.
        user: UserId,
    },
    /// Deleted messages cannot be changed.
    #[error("message {0} was deleted")]
    Deleted(MessageId),
}

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<StoredMessage>,
    next_id: u64,
}

/// Thread-safe message store.
#[derive(Debug, Default)]
pub struct MessageStore {
    inner: RwLock<Inner>,
}

impl MessageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new message and returns it.
    pub async fn create(&self, sender_id: UserId, receiver_id: UserId, text: &str) -> StoredMessage {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let msg = StoredMessage {
            id: MessageId::new(inner.next_id),
            sender_id,
            receiver_id,
            message: text.to_string(),
            created_at: Utc::now(),
            edited_at: None,
            is_deleted: false,
        };
        inner.messages.push(msg.clone());
        drop(inner);
        msg
    }

    /// Messages exchanged between `a` and `b`, oldest first.
    pub async fn conversation(&self, a: UserId, b: UserId) -> Vec<StoredMessage> {
        let key = RoomKey::new(a, b);
        let inner = self.inner.read().await;
        inner
            .messages
            .iter()
            .filter(|m| key.covers(m.sender_id, m.receiver_id))
            .cloned()
            .collect()
    }

    /// Replaces the text of a message written by `editor` in `room`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the message is missing, outside `room`,
    /// written by someone else, or deleted.
    pub async fn edit(
        &self,
        id: MessageId,
        editor: UserId,
        room: RoomKey,
        new_text: &str,
    ) -> Result<StoredMessage, StoreError> {
        let mut inner = self.inner.write().await;
        let msg = find_mut(&mut inner.messages, id)?;
        check_owned(msg, editor, room)?;
        msg.message = new_text.to_string();
        msg.edited_at = Some(Utc::now());
        Ok(msg.clone())
    }

    /// Soft-deletes a message written by `user` in `room`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`MessageStore::edit`].
    pub async fn delete(
        &self,
        id: MessageId,
        user: UserId,
        room: RoomKey,
    ) -> Result<StoredMessage, StoreError> {
        let mut inner = self.inner.write().await;
        let msg = find_mut(&mut inner.messages, id)?;
        check_owned(msg, user, room)?;
        msg.is_deleted = true;
        msg.message.clear();
        Ok(msg.clone())
    }

    /// Total number of stored messages.
    pub async fn len(&self) -> usize {
        self.inner.read().await.messages.len()
    }

    /// Returns `true` if nothing has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn find_mut(messages: &mut [StoredMessage], id: MessageId) -> Result<&mut StoredMessage, StoreError> {
    let idx = messages
        .binary_search_by_key(&id, |m| m.id)
        .map_err(|_| StoreError::NotFound(id))?;
    Ok(&mut messages[idx])
}

fn check_owned(msg: &StoredMessage, user: UserId, room: RoomKey) -> Result<(), StoreError> {
    if !room.covers(msg.sender_id, msg.receiver_id) {
        return Err(StoreError::WrongConversation(msg.id));
    }
    if msg.sender_id != user {
        return Err(StoreError::NotAuthor { id: msg.id, user });
    }
    if msg.is_deleted {
        return Err(StoreError::Deleted(msg.id));
    }
    Ok(())
}
