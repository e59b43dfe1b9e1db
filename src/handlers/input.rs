use crate::app::{App, AppEvent, Focus};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Handle keyboard input and return corresponding events
/// Does not mutate app state directly - returns events to be processed
pub fn handle_input_event(key: KeyEvent, app: &App) -> Vec<AppEvent> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return vec![AppEvent::Shutdown];
    }

    match key.code {
        KeyCode::Tab => return vec![AppEvent::FocusNext],
        KeyCode::BackTab => return vec![AppEvent::FocusPrev],
        KeyCode::Esc => return vec![AppEvent::Escape],
        _ => {}
    }

    match app.focus {
        Focus::Selector | Focus::Format => handle_text_input(key),
        Focus::Groups if app.groups.is_filtering() => handle_group_filter(key),
        Focus::Groups => handle_group_list(key),
        Focus::Output => handle_output(key),
    }
}

/// Keys for the selector and format boxes
fn handle_text_input(key: KeyEvent) -> Vec<AppEvent> {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            vec![AppEvent::InputChar(c)]
        }
        KeyCode::Backspace => vec![AppEvent::InputBackspace],
        KeyCode::Delete => vec![AppEvent::InputDelete],
        KeyCode::Left => vec![AppEvent::CursorLeft],
        KeyCode::Right => vec![AppEvent::CursorRight],
        KeyCode::Home => vec![AppEvent::CursorHome],
        KeyCode::End => vec![AppEvent::CursorEnd],
        _ => vec![],
    }
}

/// Keys while typing a group filter
fn handle_group_filter(key: KeyEvent) -> Vec<AppEvent> {
    match key.code {
        KeyCode::Char(c) => vec![AppEvent::GroupFilterChar(c)],
        KeyCode::Backspace => vec![AppEvent::GroupFilterBackspace],
        KeyCode::Enter => vec![AppEvent::AcceptGroupFilter],
        _ => vec![],
    }
}

fn handle_group_list(key: KeyEvent) -> Vec<AppEvent> {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => vec![AppEvent::GroupNext],
        KeyCode::Up | KeyCode::Char('k') => vec![AppEvent::GroupPrev],
        KeyCode::Char('/') => vec![AppEvent::StartGroupFilter],
        _ => vec![],
    }
}

fn handle_output(key: KeyEvent) -> Vec<AppEvent> {
    match key.code {
        KeyCode::Char('f') => vec![AppEvent::ToggleZoom],
        KeyCode::Char('w') => vec![AppEvent::ToggleWrap],
        KeyCode::Char('l') => vec![AppEvent::ToggleLineNumbers],
        KeyCode::Down | KeyCode::Char('j') => vec![AppEvent::ScrollDown],
        KeyCode::Up | KeyCode::Char('k') => vec![AppEvent::ScrollUp],
        KeyCode::PageDown | KeyCode::Char(' ') => vec![AppEvent::PageDown],
        KeyCode::PageUp => vec![AppEvent::PageUp],
        KeyCode::Home | KeyCode::Char('g') => vec![AppEvent::JumpToTop],
        KeyCode::End | KeyCode::Char('G') => vec![AppEvent::JumpToBottom],
        _ => vec![],
    }
}
