//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, InputMode, PanelFocus};

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match (app.focus, app.mode) {
        (PanelFocus::Input, InputMode::Edit { .. }) => "Enter: save | Esc: cancel edit",
        (PanelFocus::Input, InputMode::Compose) => {
            "Enter: send | Tab: switch panel | ^N: mark read | Esc: quit"
        }
        (PanelFocus::Sidebar, _) => "↑↓/jk: navigate | Enter: open chat | ^R: reload | Esc: quit",
        (PanelFocus::Chat, _) => "↑↓/jk: select | e: edit | d: delete | Tab: switch panel",
    };

    let (dot_color, status_text) = if app.auth_expired {
        (theme::AUTH_EXPIRED, "Session expired, sign in again".to_string())
    } else if app.view.is_connected() {
        let partner = app
            .view
            .selected_partner()
            .map_or("", |p| p.username.as_str());
        (theme::ONLINE, format!("Connected to {partner}"))
    } else {
        (theme::OFFLINE, "Disconnected".to_string())
    };

    let mut spans = vec![
        Span::styled("Collab", theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {status_text}")),
    ];

    if let Some(name) = &app.username {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(name.as_str(), theme::normal()));
    }

    let unread = app.notifications.unread_count();
    if unread > 0 {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {unread} new "), theme::unread_badge()));
        if let Some(latest) = app.notifications.items.iter().find(|n| !n.is_read) {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(latest.message.as_str(), theme::dimmed()));
        }
    }

    spans.push(Span::raw(" | "));
    spans.push(Span::styled(help_text, theme::dimmed()));

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
