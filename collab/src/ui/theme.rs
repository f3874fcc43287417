//! Palette and styles for the chat TUI.
//!
//! Colors are grouped by what they mark in the chat: chrome (borders,
//! titles, status bar), presence, message attribution and message state.

use ratatui::style::{Color, Modifier, Style};

// Chrome
pub const TEXT: Color = Color::White;
pub const MUTED: Color = Color::Gray;
pub const FOCUS: Color = Color::Cyan;
pub const CHAT_TITLE: Color = Color::Cyan;
pub const SIDEBAR_TITLE: Color = Color::Blue;
pub const STATUS_BG: Color = Color::Rgb(30, 30, 50);
pub const AUTH_EXPIRED: Color = Color::Red;

// Presence
pub const ONLINE: Color = Color::Green;
pub const OFFLINE: Color = Color::DarkGray;

// Attribution
pub const OWN_SENDER: Color = Color::LightGreen;
pub const SYSTEM_LINE: Color = Color::Rgb(100, 140, 180);
pub const TIMESTAMP: Color = Color::Rgb(120, 120, 120);

/// Partner names cycle through these so two partners rarely share a color.
pub const PARTNER_COLORS: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::LightBlue,
    Color::LightRed,
    Color::LightCyan,
    Color::Rgb(255, 165, 0),
    Color::Rgb(180, 120, 255),
];

// Message state
pub const EDITED_MARK: Color = Color::Rgb(150, 150, 110);
pub const DELETED_TEXT: Color = Color::DarkGray;
pub const TYPING: Color = Color::Rgb(140, 170, 140);
pub const UNREAD: Color = Color::Yellow;

#[must_use]
pub fn normal() -> Style {
    Style::default().fg(TEXT)
}

#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(MUTED)
}

#[must_use]
pub fn bold() -> Style {
    normal().add_modifier(Modifier::BOLD)
}

/// Border of the focused panel.
#[must_use]
pub fn focused_border() -> Style {
    Style::default().fg(FOCUS).add_modifier(Modifier::BOLD)
}

/// Border for a panel, depending on focus.
#[must_use]
pub fn border(is_focused: bool) -> Style {
    if is_focused { focused_border() } else { normal() }
}

/// Highlighted row in a focused list.
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(FOCUS)
        .add_modifier(Modifier::BOLD)
}

#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Presence color for a partner.
#[must_use]
pub const fn presence_color(is_online: bool) -> Color {
    if is_online { ONLINE } else { OFFLINE }
}

/// Presence dot shown before a partner's name.
#[must_use]
pub fn presence_dot(is_online: bool) -> Style {
    Style::default().fg(presence_color(is_online))
}

/// Sender label style: the session user is always [`OWN_SENDER`].
#[must_use]
pub fn sender(label: &str, is_self: bool) -> Style {
    let color = if is_self {
        OWN_SENDER
    } else {
        let hash = label.bytes().fold(0u32, |acc, b| {
            acc.wrapping_mul(31).wrapping_add(u32::from(b))
        });
        PARTNER_COLORS[(hash as usize) % PARTNER_COLORS.len()]
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

#[must_use]
pub fn system_message() -> Style {
    Style::default()
        .fg(SYSTEM_LINE)
        .add_modifier(Modifier::ITALIC)
}

#[must_use]
pub fn timestamp() -> Style {
    Style::default().fg(TIMESTAMP)
}

/// The "(edited)" marker after a patched message.
#[must_use]
pub fn edited_mark() -> Style {
    Style::default().fg(EDITED_MARK).add_modifier(Modifier::ITALIC)
}

/// The deleted-message placeholder.
#[must_use]
pub fn deleted() -> Style {
    Style::default()
        .fg(DELETED_TEXT)
        .add_modifier(Modifier::ITALIC | Modifier::CROSSED_OUT)
}

/// "{user} is typing..." line under the message list.
#[must_use]
pub fn typing_indicator() -> Style {
    Style::default().fg(TYPING).add_modifier(Modifier::ITALIC)
}

#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(TEXT).bg(STATUS_BG)
}

/// Unread notification count badge.
#[must_use]
pub fn unread_badge() -> Style {
    Style::default()
        .fg(UNREAD)
        .bg(STATUS_BG)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partner_color_is_stable_and_never_own_color() {
        assert_eq!(sender("acme", false), sender("acme", false));
        for name in ["acme", "bolt", "ana", "studio-k"] {
            assert_ne!(sender(name, false).fg, Some(OWN_SENDER));
        }
        assert_eq!(sender("You", true).fg, Some(OWN_SENDER));
    }

    #[test]
    fn presence_palette() {
        assert_eq!(presence_dot(true).fg, Some(ONLINE));
        assert_eq!(presence_dot(false).fg, Some(OFFLINE));
    }

    #[test]
    fn deleted_and_edited_styles_differ_from_normal_text() {
        assert_ne!(deleted(), normal());
        assert_ne!(edited_mark(), dimmed());
    }
}
