//! State of the chat view: roster, selected partner, message list, typing
//! indicator and connection flag.
//!
//! [`ChatView::apply_frame`] is the realtime channel handler: every frame
//! that arrives on the selected partner's socket is folded into this state.

use collab_proto::frame::ServerFrame;
use collab_proto::models::{ChatPartner, HistoryEntry, UserId};
use collab_proto::presence::PresenceStatus;

use super::roster::Roster;
use super::store::MessageList;

/// What a frame changed, so the caller can decide on scrolling and redraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEffect {
    /// A line was appended.
    Appended,
    /// An existing line was patched.
    Patched,
    /// Typing indicator or presence changed.
    Indicator,
    /// The frame did not change anything.
    Ignored,
}

/// Chat view state owned by the TUI loop.
#[derive(Debug)]
pub struct ChatView {
    me: UserId,
    /// Chat partners with presence.
    pub roster: Roster,
    /// Lines of the selected conversation.
    pub messages: MessageList,
    selected: Option<UserId>,
    typing_user: Option<String>,
    connected: bool,
}

impl ChatView {
    /// Creates an empty view for session user `me`.
    #[must_use]
    pub fn new(me: UserId) -> Self {
        Self {
            me,
            roster: Roster::new(),
            messages: MessageList::new(),
            selected: None,
            typing_user: None,
            connected: false,
        }
    }

    /// The session user.
    #[must_use]
    pub const fn me(&self) -> UserId {
        self.me
    }

    /// The selected partner's id.
    #[must_use]
    pub const fn selected(&self) -> Option<UserId> {
        self.selected
    }

    /// The selected partner.
    #[must_use]
    pub fn selected_partner(&self) -> Option<&ChatPartner> {
        self.selected.and_then(|id| self.roster.get(id))
    }

    /// Username of the partner currently typing.
    #[must_use]
    pub fn typing_user(&self) -> Option<&str> {
        self.typing_user.as_deref()
    }

    /// Whether the selected partner's socket is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Loads the roster.
    pub fn load_roster(&mut self, partners: Vec<ChatPartner>) {
        self.roster.load(partners, self.me);
    }

    /// Switches to `partner`, discarding the previous conversation.
    ///
    /// Returns `false` if `partner` is already selected.
    pub fn select(&mut self, partner: UserId) -> bool {
        if self.selected == Some(partner) {
            return false;
        }
        self.selected = Some(partner);
        self.messages.clear();
        self.typing_user = None;
        self.connected = false;
        true
    }

    /// Installs history for `partner` if it is still selected.
    pub fn load_history(&mut self, partner: UserId, entries: Vec<HistoryEntry>) -> bool {
        if self.selected != Some(partner) {
            tracing::debug!(partner = %partner, "discarding history for stale selection");
            return false;
        }
        self.messages.load_history(entries);
        true
    }

    /// Records the socket state for `partner`.
    pub fn set_connected(&mut self, partner: UserId, connected: bool) {
        if self.selected == Some(partner) {
            self.connected = connected;
            if !connected {
                self.typing_user = None;
            }
        }
    }

    /// Folds one frame from `partner`'s socket into the view.
    pub fn apply_frame(&mut self, partner: UserId, frame: ServerFrame) -> FrameEffect {
        if self.selected != Some(partner) {
            return FrameEffect::Ignored;
        }

        match frame {
            ServerFrame::TypingStart { sender_username } => {
                self.typing_user = Some(sender_username);
                FrameEffect::Indicator
            }
            ServerFrame::TypingStop { .. } => {
                self.typing_user = None;
                FrameEffect::Indicator
            }
            ServerFrame::MessageEdited {
                message_id,
                new_message,
                edited_at,
            } => {
                if self.messages.apply_edit(message_id, &new_message, edited_at) {
                    FrameEffect::Patched
                } else {
                    FrameEffect::Ignored
                }
            }
            ServerFrame::MessageDeleted { message_id } => {
                if self.messages.apply_delete(message_id) {
                    FrameEffect::Patched
                } else {
                    FrameEffect::Ignored
                }
            }
            ServerFrame::UserOnline { user_id } => self.presence(user_id, PresenceStatus::Online),
            ServerFrame::UserOffline { user_id } => {
                self.presence(user_id, PresenceStatus::Offline)
            }
            ServerFrame::NewMessage(msg) => {
                if msg.sender_id == self.me {
                    // Already shown as a local echo.
                    return FrameEffect::Ignored;
                }
                self.messages.push_incoming(msg);
                FrameEffect::Appended
            }
        }
    }

    fn presence(&mut self, user: UserId, status: PresenceStatus) -> FrameEffect {
        if self.roster.set_presence(user, status) {
            FrameEffect::Indicator
        } else {
            FrameEffect::Ignored
        }
    }
}
