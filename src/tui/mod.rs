mod output_view;
mod panes;
mod status_bar;

use crate::app::{App, Focus};
use ratatui::{
    style::{Color, Style},
    Frame,
};

fn border_style(app: &App, pane: Focus) -> Style {
    if app.focus == pane {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn render(f: &mut Frame, app: &App) {
    let layout = *app.layout();

    if !app.zoomed {
        panes::render_input(f, layout.selector, app, Focus::Selector);
        panes::render_input(f, layout.format, app, Focus::Format);
        panes::render_groups(f, layout.groups, app);
    }
    output_view::render_output(f, layout.output, app);
    status_bar::render_status_bar(f, layout.footer, app);
}
