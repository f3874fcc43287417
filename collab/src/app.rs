//! Application state and event handling.
//!
//! [`App`] owns all view state and is driven from the TUI loop: key events
//! and timer ticks turn into [`NetCommand`]s for the session task, and
//! [`NetEvent`]s coming back are folded in by [`App::apply_net_event`].

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use collab_proto::models::{MessageId, UserId};

use crate::chat::{ChatView, FrameEffect, TypingDebounce};
use crate::net::{NetCommand, NetEvent};
use crate::notifications::NotificationFeed;

/// Which panel is currently focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Input box is focused (default).
    Input,
    /// Sidebar partner list is focused.
    Sidebar,
    /// Chat message list is focused.
    Chat,
}

/// What the input box is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Composing a new message.
    Compose,
    /// Replacing the text of an existing message.
    Edit {
        /// The message being edited.
        message_id: MessageId,
    },
}

/// Main application state.
pub struct App {
    /// Chat view state (roster, conversation, typing, presence).
    pub view: ChatView,
    /// Session user's display name, if configured.
    pub username: Option<String>,
    /// chrono format for message timestamps.
    pub timestamp_format: String,
    /// Current text input.
    pub input: String,
    /// Cursor position in input (character index).
    pub cursor_position: usize,
    /// What the input box is editing.
    pub mode: InputMode,
    /// Which panel is focused.
    pub focus: PanelFocus,
    /// Highlighted row in the sidebar.
    pub sidebar_index: usize,
    /// Highlighted line in the chat panel when it is focused.
    pub selected_line: Option<usize>,
    /// Latest notification feed.
    pub notifications: NotificationFeed,
    /// Set when the server rejected the token.
    pub auth_expired: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
    composer: TypingDebounce,
}

impl App {
    /// Create an empty application for session user `me`.
    #[must_use]
    pub fn new(me: UserId, typing_timeout: Duration) -> Self {
        Self {
            view: ChatView::new(me),
            username: None,
            timestamp_format: "%H:%M".to_string(),
            input: String::new(),
            cursor_position: 0,
            mode: InputMode::Compose,
            focus: PanelFocus::Sidebar,
            sidebar_index: 0,
            selected_line: None,
            notifications: NotificationFeed::default(),
            auth_expired: false,
            should_quit: false,
            composer: TypingDebounce::new(typing_timeout),
        }
    }

    /// Set the session user's display name.
    #[must_use]
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// Set the chrono format used for message timestamps.
    #[must_use]
    pub fn with_timestamp_format(mut self, format: &str) -> Self {
        self.timestamp_format = format.to_string();
        self
    }

    /// Append a client-generated line to the conversation.
    pub fn push_system_message(&mut self, text: impl Into<String>) {
        self.view.messages.push_system(text);
    }

    /// Whether the composer is currently signalling typing.
    #[must_use]
    pub const fn is_typing(&self) -> bool {
        self.composer.is_typing()
    }

    /// Handle a key event at time `now`, returning commands for the
    /// session task.
    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) -> Vec<NetCommand> {
        // Global shortcuts
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return Vec::new();
            }
            (KeyCode::Esc, _) => {
                if matches!(self.mode, InputMode::Edit { .. }) {
                    self.cancel_edit();
                } else {
                    self.should_quit = true;
                }
                return Vec::new();
            }
            (KeyCode::Char('n'), KeyModifiers::CONTROL) => return self.mark_notifications_read(),
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => return vec![NetCommand::RefreshUsers],
            (KeyCode::Tab, KeyModifiers::SHIFT) | (KeyCode::BackTab, _) => {
                self.cycle_focus_backward();
                return Vec::new();
            }
            (KeyCode::Tab, _) => {
                self.cycle_focus_forward();
                return Vec::new();
            }
            _ => {}
        }

        // Focus-specific shortcuts
        match self.focus {
            PanelFocus::Input => self.handle_input_key(key, now),
            PanelFocus::Sidebar => self.handle_sidebar_key(key),
            PanelFocus::Chat => self.handle_chat_key(key),
        }
    }

    /// Advance timers. Returns a typing-stop once the composer goes idle.
    pub fn tick(&mut self, now: Instant) -> Option<NetCommand> {
        self.composer.tick(now).map(NetCommand::Typing)
    }

    /// Fold an event from the session task into the view.
    pub fn apply_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::UsersLoaded(users) => {
                self.view.load_roster(users);
                if self.view.roster.is_empty() {
                    self.push_system_message("No chat partners yet");
                }
                self.sidebar_index = self
                    .sidebar_index
                    .min(self.view.roster.len().saturating_sub(1));
            }
            NetEvent::HistoryLoaded { partner, entries } => {
                self.view.load_history(partner, entries);
                self.selected_line = None;
            }
            NetEvent::ConnectionStatus { partner, connected } => {
                let was = self.view.is_connected();
                self.view.set_connected(partner, connected);
                if self.view.selected() == Some(partner) && was != connected {
                    if connected {
                        self.push_system_message("Connected");
                    } else {
                        self.push_system_message("Disconnected");
                    }
                }
            }
            NetEvent::Frame { partner, frame } => {
                if self.view.apply_frame(partner, frame) == FrameEffect::Appended
                    && self.focus != PanelFocus::Chat
                {
                    self.selected_line = None;
                }
            }
            NetEvent::Notifications(feed) => {
                self.notifications = feed;
            }
            NetEvent::Unauthorized => {
                if !self.auth_expired {
                    self.auth_expired = true;
                    self.push_system_message("Session expired, please sign in again");
                }
            }
            NetEvent::Error(msg) => {
                self.push_system_message(msg);
            }
        }
    }

    /// Handle key event when input is focused.
    fn handle_input_key(&mut self, key: KeyEvent, now: Instant) -> Vec<NetCommand> {
        match key.code {
            KeyCode::Enter => match self.mode {
                InputMode::Compose => self.submit_message(),
                InputMode::Edit { message_id } => self.save_edit(message_id),
            },
            KeyCode::Char(c) => {
                self.enter_char(c);
                self.typing_input(now)
            }
            KeyCode::Backspace => {
                if self.delete_char() {
                    self.typing_input(now)
                } else {
                    Vec::new()
                }
            }
            KeyCode::Left => {
                self.move_cursor_left();
                Vec::new()
            }
            KeyCode::Right => {
                self.move_cursor_right();
                Vec::new()
            }
            KeyCode::Home => {
                self.cursor_position = 0;
                Vec::new()
            }
            KeyCode::End => {
                self.cursor_position = self.input.chars().count();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Typing signals only apply to new messages on an open socket.
    fn typing_input(&mut self, now: Instant) -> Vec<NetCommand> {
        if self.mode != InputMode::Compose || !self.view.is_connected() {
            return Vec::new();
        }
        self.composer
            .on_input(now)
            .map(NetCommand::Typing)
            .into_iter()
            .collect()
    }

    /// Handle key event when sidebar is focused.
    fn handle_sidebar_key(&mut self, key: KeyEvent) -> Vec<NetCommand> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.sidebar_index = self.sidebar_index.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.sidebar_index + 1 < self.view.roster.len() {
                    self.sidebar_index += 1;
                }
                Vec::new()
            }
            KeyCode::Enter => self.select_highlighted(),
            _ => Vec::new(),
        }
    }

    /// Handle key event when chat is focused.
    fn handle_chat_key(&mut self, key: KeyEvent) -> Vec<NetCommand> {
        let len = self.view.messages.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_line = Some(match self.selected_line {
                    Some(i) => i.saturating_sub(1),
                    None => len.saturating_sub(1),
                });
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_line = match self.selected_line {
                    Some(i) if i + 1 < len => Some(i + 1),
                    other => other,
                };
                Vec::new()
            }
            KeyCode::Char('e') => {
                self.begin_edit();
                Vec::new()
            }
            KeyCode::Char('d') => self.delete_selected(),
            _ => Vec::new(),
        }
    }

    /// Open the conversation highlighted in the sidebar.
    fn select_highlighted(&mut self) -> Vec<NetCommand> {
        let Some(partner) = self.view.roster.at(self.sidebar_index).map(|p| p.id) else {
            return Vec::new();
        };
        if !self.view.select(partner) {
            self.focus = PanelFocus::Input;
            // Same partner: only reopen a dropped socket.
            if self.view.is_connected() {
                return Vec::new();
            }
            return vec![NetCommand::SelectPartner(partner)];
        }
        self.composer.reset();
        self.mode = InputMode::Compose;
        self.selected_line = None;
        self.clear_input();
        self.focus = PanelFocus::Input;
        vec![NetCommand::SelectPartner(partner)]
    }

    /// Submit the current input as a message.
    fn submit_message(&mut self) -> Vec<NetCommand> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return Vec::new();
        }
        if self.view.selected().is_none() {
            self.push_system_message("Select a conversation first");
            return Vec::new();
        }
        if !self.view.is_connected() {
            self.push_system_message("Not connected, message not sent");
            return Vec::new();
        }

        self.view.messages.push_local(&text);
        self.clear_input();
        self.selected_line = None;

        vec![
            NetCommand::SendMessage { text },
            NetCommand::Typing(self.composer.on_send()),
        ]
    }

    /// Start editing the highlighted line, if it is the user's own.
    fn begin_edit(&mut self) {
        let Some(line) = self.selected_line.and_then(|i| self.view.messages.get(i)) else {
            return;
        };
        let Some(message_id) = line.id.filter(|_| line.is_modifiable()) else {
            return;
        };
        self.input = line.text.clone();
        self.cursor_position = self.input.chars().count();
        self.mode = InputMode::Edit { message_id };
        self.focus = PanelFocus::Input;
    }

    fn save_edit(&mut self, message_id: MessageId) -> Vec<NetCommand> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return Vec::new();
        }
        self.mode = InputMode::Compose;
        self.clear_input();
        vec![NetCommand::EditMessage { message_id, text }]
    }

    fn cancel_edit(&mut self) {
        self.mode = InputMode::Compose;
        self.clear_input();
    }

    fn delete_selected(&mut self) -> Vec<NetCommand> {
        let Some(line) = self.selected_line.and_then(|i| self.view.messages.get(i)) else {
            return Vec::new();
        };
        match line.id.filter(|_| line.is_modifiable()) {
            Some(message_id) => vec![NetCommand::DeleteMessage { message_id }],
            None => Vec::new(),
        }
    }

    fn mark_notifications_read(&mut self) -> Vec<NetCommand> {
        let unread: Vec<u64> = self
            .notifications
            .items
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id)
            .collect();
        unread
            .into_iter()
            .map(|id| {
                self.notifications.mark_read(id);
                NetCommand::MarkNotificationRead { id }
            })
            .collect()
    }

    /// Cycle focus forward: Sidebar -> Input -> Chat -> Sidebar.
    const fn cycle_focus_forward(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Sidebar => PanelFocus::Input,
            PanelFocus::Input => PanelFocus::Chat,
            PanelFocus::Chat => PanelFocus::Sidebar,
        };
    }

    /// Cycle focus backward: Sidebar -> Chat -> Input -> Sidebar.
    const fn cycle_focus_backward(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Sidebar => PanelFocus::Chat,
            PanelFocus::Chat => PanelFocus::Input,
            PanelFocus::Input => PanelFocus::Sidebar,
        };
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Byte offset of the cursor.
    fn cursor_byte(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.input.len(), |(i, _)| i)
    }

    /// Insert a character at the cursor position.
    fn enter_char(&mut self, c: char) {
        let at = self.cursor_byte();
        self.input.insert(at, c);
        self.cursor_position += 1;
    }

    /// Delete the character before the cursor. Returns whether anything
    /// was removed.
    fn delete_char(&mut self) -> bool {
        if self.cursor_position == 0 {
            return false;
        }
        self.cursor_position -= 1;
        let at = self.cursor_byte();
        self.input.remove(at);
        true
    }

    /// Move cursor left.
    const fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    /// Move cursor right.
    fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }
}
