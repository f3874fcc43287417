//! Sidebar rendering for the chat partner list.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

use super::theme;
use crate::app::{App, PanelFocus};

/// Render the sidebar with the partner list and presence dots.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus == PanelFocus::Sidebar;
    let selected = app.view.selected();

    let items: Vec<ListItem> = app
        .view
        .roster
        .partners()
        .iter()
        .map(|partner| {
            let name_style = if selected == Some(partner.id) {
                theme::bold()
            } else {
                theme::normal()
            };
            ListItem::new(Line::from(vec![
                Span::styled("● ", theme::presence_dot(partner.is_online)),
                Span::styled(partner.username.as_str(), name_style),
            ]))
        })
        .collect();

    let block = Block::default()
        .title(Span::styled("Chats", theme::panel_title(theme::SIDEBAR_TITLE)))
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused));

    let list = List::new(items).block(block).highlight_style(if is_focused {
        theme::selected()
    } else {
        theme::focused_border()
    });

    let mut state = ListState::default();
    if !app.view.roster.is_empty() {
        state.select(Some(app.sidebar_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
