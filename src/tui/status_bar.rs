use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Right-hand footer text: scroll position and active display flags.
pub(super) fn footer_flags(app: &App) -> String {
    let mut text = format!("{:>3}%", app.output.scroll_percent());
    if app.output.is_pinned() {
        text.push_str(" PINNED");
    }
    if app.wrap() {
        text.push_str(" WRAP");
    }
    if app.line_numbers() {
        text.push_str(" LN");
    }
    if app.is_shutting_down() {
        text.push_str(" stopping...");
    }
    text.push(' ');
    text
}

pub(super) fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let flags = footer_flags(app);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(flags.len() as u16)])
        .split(area);

    let color = if app.failed { Color::Red } else { Color::DarkGray };
    let left = Line::from(Span::styled(
        format!(" {}", app.command),
        Style::default().fg(color),
    ));
    f.render_widget(Paragraph::new(left), chunks[0]);
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            flags,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))),
        chunks[1],
    );
}
