//! Ordered message list for the selected conversation.
//!
//! Lines are appended in arrival order and never removed or reordered.
//! Edits and deletes patch the matching line in place; a deleted line keeps
//! its slot but its text is never rendered again.

use chrono::{DateTime, Utc};

use collab_proto::frame::IncomingMessage;
use collab_proto::models::{HistoryEntry, MessageId};

/// Placeholder rendered in place of a deleted message.
pub const DELETED_PLACEHOLDER: &str = "Message deleted";

/// Who a line is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    /// The session user.
    Me,
    /// The partner, by display name.
    Partner(String),
    /// Client-generated notice (connection changes, errors).
    System,
}

/// One line of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    /// Server id. `None` for local echoes and system lines.
    pub id: Option<MessageId>,
    /// Attribution.
    pub author: Author,
    /// Stored text. Not shown once deleted.
    pub text: String,
    /// Creation time, when known.
    pub timestamp: Option<DateTime<Utc>>,
    /// Time of the last edit.
    pub edited_at: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

impl ChatLine {
    /// Sender label: `"You"` for the session user.
    #[must_use]
    pub fn sender_label(&self) -> &str {
        match &self.author {
            Author::Me => "You",
            Author::Partner(name) => name,
            Author::System => "*",
        }
    }

    /// Text to display.
    #[must_use]
    pub fn rendered_text(&self) -> &str {
        if self.is_deleted {
            DELETED_PLACEHOLDER
        } else {
            &self.text
        }
    }

    /// Whether the session user may edit or delete this line.
    #[must_use]
    pub fn is_modifiable(&self) -> bool {
        self.author == Author::Me && !self.is_deleted && self.id.is_some()
    }

    /// Whether this is a client-generated notice.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.author == Author::System
    }
}

impl From<HistoryEntry> for ChatLine {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            id: Some(entry.id),
            author: if entry.is_self {
                Author::Me
            } else {
                Author::Partner(entry.sender_username)
            },
            text: entry.message,
            timestamp: Some(entry.timestamp),
            edited_at: entry.edited_at,
            is_deleted: entry.is_deleted,
        }
    }
}

/// Messages of the selected conversation, in arrival order.
#[derive(Debug, Default)]
pub struct MessageList {
    lines: Vec<ChatLine>,
}

impl MessageList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with a freshly loaded history.
    pub fn load_history(&mut self, entries: Vec<HistoryEntry>) {
        self.lines = entries.into_iter().map(ChatLine::from).collect();
    }

    /// Drops every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Appends the session user's own message as sent, without an id.
    pub fn push_local(&mut self, text: &str) {
        self.lines.push(ChatLine {
            id: None,
            author: Author::Me,
            text: text.to_string(),
            timestamp: Some(Utc::now()),
            edited_at: None,
            is_deleted: false,
        });
    }

    /// Appends a message delivered by the partner.
    pub fn push_incoming(&mut self, msg: IncomingMessage) {
        self.lines.push(ChatLine {
            id: msg.id,
            author: Author::Partner(msg.sender_username),
            text: msg.message,
            timestamp: Some(Utc::now()),
            edited_at: None,
            is_deleted: false,
        });
    }

    /// Appends a client-generated notice.
    pub fn push_system(&mut self, text: impl Into<String>) {
        self.lines.push(ChatLine {
            id: None,
            author: Author::System,
            text: text.into(),
            timestamp: None,
            edited_at: None,
            is_deleted: false,
        });
    }

    /// Patches the line with `id`. Returns `false` if no line has it.
    pub fn apply_edit(&mut self, id: MessageId, text: &str, edited_at: DateTime<Utc>) -> bool {
        let Some(line) = self.find_mut(id) else {
            return false;
        };
        line.text = text.to_string();
        line.edited_at = Some(edited_at);
        true
    }

    /// Marks the line with `id` deleted. Returns `false` if no line has it.
    pub fn apply_delete(&mut self, id: MessageId) -> bool {
        let Some(line) = self.find_mut(id) else {
            return false;
        };
        line.is_deleted = true;
        true
    }

    /// Lines in arrival order.
    #[must_use]
    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }

    /// Line at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ChatLine> {
        self.lines.get(index)
    }

    /// Line with server id `id`.
    #[must_use]
    pub fn find(&self, id: MessageId) -> Option<&ChatLine> {
        self.lines.iter().find(|l| l.id == Some(id))
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn find_mut(&mut self, id: MessageId) -> Option<&mut ChatLine> {
        self.lines.iter_mut().find(|l| l.id == Some(id))
    }
}
