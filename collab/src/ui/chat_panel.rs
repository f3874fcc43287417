//! Chat panel rendering (header, message list, typing line, input box).

use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::theme;
use crate::app::{App, InputMode, PanelFocus};
use crate::chat::{Author, ChatLine};

/// Render the chat panel.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);

    render_messages(frame, chunks[0], app);
    render_typing(frame, chunks[1], app);
    render_input(frame, chunks[2], app);
}

fn title(app: &App) -> Line<'_> {
    let Some(partner) = app.view.selected_partner() else {
        return Line::from(Span::styled("Select a chat", theme::dimmed()));
    };
    let presence = if partner.is_online { "Online" } else { "Offline" };
    Line::from(vec![
        Span::styled(partner.username.as_str(), theme::panel_title(theme::CHAT_TITLE)),
        Span::raw(" "),
        Span::styled(presence, theme::presence_dot(partner.is_online)),
    ])
}

fn line_item<'a>(line: &'a ChatLine, app: &App) -> ListItem<'a> {
    if line.is_system() {
        return ListItem::new(Line::from(Span::styled(
            line.rendered_text(),
            theme::system_message(),
        )));
    }

    let timestamp = line.timestamp.map_or_else(String::new, |t| {
        t.with_timezone(&Local)
            .format(&app.timestamp_format)
            .to_string()
    });
    let sender = line.sender_label();

    let mut spans = vec![
        Span::styled(timestamp, theme::timestamp()),
        Span::raw(" "),
        Span::styled(sender, theme::sender(sender, line.author == Author::Me)),
        Span::raw(": "),
    ];
    if line.is_deleted {
        spans.push(Span::styled(line.rendered_text(), theme::deleted()));
    } else {
        spans.push(Span::styled(line.rendered_text(), theme::normal()));
        if line.edited_at.is_some() {
            spans.push(Span::styled(" (edited)", theme::edited_mark()));
        }
    }
    ListItem::new(Line::from(spans))
}

/// Render the message list, keeping the selected line (or the newest) in
/// view.
fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus == PanelFocus::Chat;

    let items: Vec<ListItem> = app
        .view
        .messages
        .lines()
        .iter()
        .map(|line| line_item(line, app))
        .collect();

    let block = Block::default()
        .title(title(app))
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused));

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::selected());

    let last = app.view.messages.len().checked_sub(1);
    let mut state = ListState::default();
    if is_focused {
        state.select(app.selected_line.or(last));
    } else {
        // Scroll to the newest line without highlighting it.
        *state.offset_mut() = app.view.messages.len().saturating_sub(
            usize::from(area.height.saturating_sub(2)),
        );
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_typing(frame: &mut Frame, area: Rect, app: &App) {
    let line = app.view.typing_user().map_or_else(Line::default, |user| {
        Line::from(Span::styled(format!(" {user} is typing..."), theme::typing_indicator()))
    });
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the input box.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus == PanelFocus::Input;

    // Build the input text with cursor
    let mut display_text = app.input.clone();
    if is_focused {
        let at = display_text
            .char_indices()
            .nth(app.cursor_position)
            .map_or(display_text.len(), |(i, _)| i);
        display_text.insert(at, '█');
    }

    let input_line = if display_text.is_empty() && !is_focused {
        Line::from(Span::styled("Type a message...", theme::dimmed()))
    } else {
        Line::from(Span::styled(display_text, theme::normal()))
    };

    let title = match app.mode {
        InputMode::Compose => "Message",
        InputMode::Edit { .. } => "Edit message",
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused));

    frame.render_widget(Paragraph::new(input_line).block(block), area);
}
