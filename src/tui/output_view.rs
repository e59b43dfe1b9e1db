use super::border_style;
use crate::app::{App, Focus};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub(super) fn render_output(f: &mut Frame, area: Rect, app: &App) {
    let rows: Vec<Line> = app
        .output
        .visible_rows()
        .iter()
        .map(|row| Line::from(row.as_str()))
        .collect();

    let title = if app.zoomed {
        " Output (zoomed) "
    } else {
        " Output "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, Focus::Output))
        .title(title);

    let style = if app.output.raw_lines().is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    f.render_widget(Paragraph::new(rows).style(style).block(block), area);
}
