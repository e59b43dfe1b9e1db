use super::border_style;
use crate::app::{App, Focus};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

pub(super) fn render_input(f: &mut Frame, area: Rect, app: &App, pane: Focus) {
    let (title, input) = match pane {
        Focus::Format => (" Format ", &app.format),
        _ => (" Selector ", &app.selector),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, pane))
        .title(title);
    f.render_widget(Paragraph::new(input.value()).block(block), area);

    if app.focus == pane && area.width > 2 && area.height > 2 {
        let before: String = input.value().chars().take(input.cursor()).collect();
        let x = area.x + 1 + (before.width() as u16).min(area.width - 3);
        f.set_cursor_position(Position::new(x, area.y + 1));
    }
}

pub(super) fn render_groups(f: &mut Frame, area: Rect, app: &App) {
    let groups = &app.groups;
    let items: Vec<ListItem> = groups
        .visible()
        .into_iter()
        .map(|g| ListItem::new(Line::from(g.to_string())))
        .collect();

    let title = if groups.has_filter() {
        let cursor = if groups.is_filtering() { "_" } else { "" };
        Line::from(vec![
            Span::raw(" /"),
            Span::styled(
                format!("{}{} ", groups.filter(), cursor),
                Style::default().fg(Color::Yellow),
            ),
        ])
    } else {
        Line::from(" Groups ")
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, Focus::Groups))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(groups.selected_index());
    f.render_stateful_widget(list, area, &mut state);
}
