pub mod event;
pub mod groups;
pub mod input;
pub mod layout;
pub mod output;

pub use event::AppEvent;

use crate::format::FormatOptions;
use crate::pipeline::coordinator::StreamCommand;
use crate::pipeline::{StreamEvent, StreamKind, StreamMessage, StreamParams};
use crate::query;
use groups::GroupList;
use input::TextInput;
use layout::PaneLayout;
use output::OutputView;
use ratatui::layout::Rect;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Which pane receives keys. Cycles in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Selector,
    Format,
    Groups,
    Output,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Selector => Focus::Format,
            Focus::Format => Focus::Groups,
            Focus::Groups => Focus::Output,
            Focus::Output => Focus::Selector,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Selector => Focus::Output,
            Focus::Format => Focus::Selector,
            Focus::Groups => Focus::Format,
            Focus::Output => Focus::Groups,
        }
    }
}

/// Initial values for the interactive session.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub selector: String,
    pub format: String,
    pub wrap: bool,
    pub line_numbers: bool,
    pub list_min_width: u16,
    pub list_max_width: u16,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            selector: String::new(),
            format: String::new(),
            wrap: false,
            line_numbers: false,
            list_min_width: groups::DEFAULT_MIN_WIDTH,
            list_max_width: groups::DEFAULT_MAX_WIDTH,
        }
    }
}

/// Main application state
///
/// Mutated only through [`App::apply_event`], one event at a time. Pipeline
/// restarts are queued as [`StreamCommand`]s for the caller to forward.
pub struct App {
    path: PathBuf,
    pub focus: Focus,
    pub zoomed: bool,
    pub selector: TextInput,
    pub format: TextInput,
    pub groups: GroupList,
    pub output: OutputView,
    /// Command line of the pipeline whose output is on screen.
    pub command: String,
    /// The output pane holds a pipeline error instead of records.
    pub failed: bool,
    wrap: bool,
    line_numbers: bool,
    area: Rect,
    layout: PaneLayout,
    content_generation: u64,
    groups_generation: u64,
    commands: Vec<StreamCommand>,
    shutting_down: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(path: impl Into<PathBuf>, settings: AppSettings, width: u16, height: u16) -> Self {
        let opts = FormatOptions {
            width: 0,
            wrap: settings.wrap,
            line_numbers: settings.line_numbers,
        };
        let mut app = Self {
            path: path.into(),
            focus: Focus::Selector,
            zoomed: false,
            selector: TextInput::new(settings.selector),
            format: TextInput::new(settings.format),
            groups: GroupList::new(settings.list_min_width, settings.list_max_width),
            output: OutputView::new(opts, 0),
            command: String::new(),
            failed: false,
            wrap: settings.wrap,
            line_numbers: settings.line_numbers,
            area: Rect::new(0, 0, width, height),
            layout: PaneLayout::default(),
            content_generation: 0,
            groups_generation: 0,
            commands: Vec::new(),
            shutting_down: false,
            should_quit: false,
        };
        app.relayout();
        app
    }

    pub fn layout(&self) -> &PaneLayout {
        &self.layout
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    pub fn line_numbers(&self) -> bool {
        self.line_numbers
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Kick off the first groups pipeline; content follows its first event.
    pub fn start(&mut self) {
        self.restart_groups();
    }

    /// Drain the pipeline commands queued since the last call.
    pub fn take_commands(&mut self) -> Vec<StreamCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::FocusNext => self.move_focus(Focus::next),
            AppEvent::FocusPrev => self.move_focus(Focus::prev),
            AppEvent::Escape => self.escape(),
            AppEvent::Shutdown => self.shutdown(),

            AppEvent::InputChar(c) => self.edit_input(|input| {
                input.insert(c);
                true
            }),
            AppEvent::InputBackspace => self.edit_input(TextInput::backspace),
            AppEvent::InputDelete => self.edit_input(TextInput::delete),
            AppEvent::CursorLeft => self.move_cursor(TextInput::move_left),
            AppEvent::CursorRight => self.move_cursor(TextInput::move_right),
            AppEvent::CursorHome => self.move_cursor(TextInput::move_home),
            AppEvent::CursorEnd => self.move_cursor(TextInput::move_end),

            AppEvent::GroupNext => self.change_group(GroupList::select_next),
            AppEvent::GroupPrev => self.change_group(GroupList::select_prev),
            AppEvent::StartGroupFilter if self.focus == Focus::Groups => {
                self.groups.start_filter()
            }
            AppEvent::GroupFilterChar(c) => self.groups.filter_push(c),
            AppEvent::GroupFilterBackspace => self.groups.filter_pop(),
            AppEvent::AcceptGroupFilter => self.groups.accept_filter(),
            AppEvent::StartGroupFilter => {}

            AppEvent::ToggleZoom if self.focus == Focus::Output => {
                self.zoomed = !self.zoomed;
                debug!(zoomed = self.zoomed, "toggle zoom");
                self.relayout();
            }
            AppEvent::ToggleWrap if self.focus == Focus::Output => {
                self.wrap = !self.wrap;
                self.relayout();
            }
            AppEvent::ToggleLineNumbers if self.focus == Focus::Output => {
                self.line_numbers = !self.line_numbers;
                self.relayout();
            }
            AppEvent::ScrollDown if self.focus == Focus::Output => self.output.scroll_down(1),
            AppEvent::ScrollUp if self.focus == Focus::Output => self.output.scroll_up(1),
            AppEvent::PageDown if self.focus == Focus::Output => self.output.page_down(),
            AppEvent::PageUp if self.focus == Focus::Output => self.output.page_up(),
            AppEvent::JumpToTop if self.focus == Focus::Output => self.output.jump_to_top(),
            AppEvent::JumpToBottom if self.focus == Focus::Output => self.output.jump_to_bottom(),
            AppEvent::ToggleZoom
            | AppEvent::ToggleWrap
            | AppEvent::ToggleLineNumbers
            | AppEvent::ScrollDown
            | AppEvent::ScrollUp
            | AppEvent::PageDown
            | AppEvent::PageUp
            | AppEvent::JumpToTop
            | AppEvent::JumpToBottom => {}

            AppEvent::Resize { width, height } => {
                self.area = Rect::new(0, 0, width, height);
                self.relayout();
            }

            AppEvent::Stream(message) => self.apply_stream(message),
            AppEvent::ShutdownComplete => {
                info!("pipelines stopped, quitting");
                self.should_quit = true;
            }
        }
    }

    fn move_focus(&mut self, step: fn(Focus) -> Focus) {
        if self.zoomed {
            return;
        }
        self.groups.accept_filter();
        self.focus = step(self.focus);
    }

    fn escape(&mut self) {
        if self.focus == Focus::Groups && self.groups.has_filter() {
            self.groups.clear_filter();
        } else if self.zoomed {
            self.zoomed = false;
            self.relayout();
        } else {
            self.shutdown();
        }
    }

    fn shutdown(&mut self) {
        if self.shutting_down {
            return;
        }
        info!("shutdown requested");
        self.shutting_down = true;
        self.commands.push(StreamCommand::Stop);
    }

    fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            Focus::Selector => Some(&mut self.selector),
            Focus::Format => Some(&mut self.format),
            Focus::Groups | Focus::Output => None,
        }
    }

    fn move_cursor(&mut self, f: fn(&mut TextInput)) {
        if let Some(input) = self.focused_input() {
            f(input);
        }
    }

    /// Apply an edit to the focused box; restart pipelines if its value changed.
    fn edit_input<F: FnOnce(&mut TextInput) -> bool>(&mut self, edit: F) {
        let Some(input) = self.focused_input() else {
            return;
        };
        if !edit(input) {
            return;
        }
        match self.focus {
            Focus::Selector => {
                let selector = self.selector.value();
                if query::is_incomplete_selector(selector) {
                    debug!(selector, "selector incomplete, not restarting");
                    return;
                }
                self.restart_groups();
            }
            Focus::Format => self.restart_content(),
            Focus::Groups | Focus::Output => {}
        }
    }

    fn change_group(&mut self, step: fn(&mut GroupList) -> bool) {
        if self.focus != Focus::Groups || self.groups.is_filtering() {
            return;
        }
        if step(&mut self.groups) {
            debug!(group = %self.groups.selected(), "group selected");
            self.restart_content();
        }
    }

    fn params(&self) -> StreamParams {
        StreamParams {
            path: self.path.clone(),
            selector: self.selector.value().to_string(),
            format: self.format.value().to_string(),
            group: self.groups.selected().to_string(),
            bound: None,
        }
    }

    /// Queue a start, superseding any start of the same kind not yet taken.
    fn push_start(&mut self, kind: StreamKind, generation: u64) {
        self.commands
            .retain(|c| !matches!(c, StreamCommand::Start { kind: k, .. } if *k == kind));
        let params = self.params();
        info!(%kind, generation, selector = %params.selector, format = %params.format, group = %params.group, "restart");
        self.commands.push(StreamCommand::Start {
            kind,
            generation,
            params,
        });
    }

    fn restart_groups(&mut self) {
        if self.shutting_down {
            return;
        }
        self.groups_generation += 1;
        self.push_start(StreamKind::Groups, self.groups_generation);
    }

    fn restart_content(&mut self) {
        if self.shutting_down {
            return;
        }
        self.content_generation += 1;
        self.push_start(StreamKind::Content, self.content_generation);
    }

    fn is_current(&self, message: &StreamMessage) -> bool {
        let latest = match message.kind {
            StreamKind::Content => self.content_generation,
            StreamKind::Groups => self.groups_generation,
        };
        message.generation == latest
    }

    fn apply_stream(&mut self, message: StreamMessage) {
        if !self.is_current(&message) {
            debug!(kind = %message.kind, generation = message.generation, "dropping stale stream event");
            return;
        }
        match message.kind {
            StreamKind::Content => self.apply_content(message.event),
            StreamKind::Groups => self.apply_groups(message.event),
        }
    }

    fn apply_content(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Started { lines, command } => {
                self.output.replace(lines);
                self.command = command;
                self.failed = false;
            }
            StreamEvent::Line(line) => self.output.append(line),
            StreamEvent::Error { message, command } => {
                warn!(%command, %message, "content pipeline failed");
                self.show_error(&message, command);
            }
            StreamEvent::Stopped => debug!("content pipeline stopped"),
            StreamEvent::GroupDiscovered(_) => {}
        }
    }

    fn apply_groups(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Started { lines, .. } => {
                if self.groups.replace(lines) {
                    debug!("selected group vanished, back to all");
                }
                self.relayout();
                self.restart_content();
            }
            StreamEvent::GroupDiscovered(group) => {
                if self.groups.insert(group) {
                    self.relayout();
                }
            }
            StreamEvent::Error { message, command } => {
                warn!(%command, %message, "groups pipeline failed");
                self.groups.reset();
                self.relayout();
                // Content stays stopped under the error until the next edit
                // or selection restarts it.
                self.stop_content();
                self.show_error(&message, command);
            }
            StreamEvent::Stopped => debug!("groups pipeline stopped"),
            StreamEvent::Line(_) => {}
        }
    }

    fn show_error(&mut self, message: &str, command: String) {
        self.output
            .replace(message.lines().map(str::to_string).collect());
        self.command = command;
        self.failed = true;
    }

    /// Cancel the content pipeline without starting another one.
    fn stop_content(&mut self) {
        if self.shutting_down {
            return;
        }
        self.content_generation += 1;
        self.commands.retain(
            |c| !matches!(c, StreamCommand::Start { kind: StreamKind::Content, .. }),
        );
        self.commands.push(StreamCommand::Cancel {
            kind: StreamKind::Content,
        });
    }

    /// Recompute pane geometry and reformat the output if its width changed.
    fn relayout(&mut self) {
        self.layout = PaneLayout::compute(self.area, self.zoomed, self.groups.width());
        let (width, height) = self.layout.output_inner();
        self.output.set_options(FormatOptions {
            width,
            wrap: self.wrap,
            line_numbers: self.line_numbers,
        });
        self.output.set_height(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let settings = AppSettings {
            selector: ".level".into(),
            format: ".msg".into(),
            ..AppSettings::default()
        };
        App::new("/tmp/app.log", settings, 100, 30)
    }

    fn stream(kind: StreamKind, generation: u64, event: StreamEvent) -> AppEvent {
        AppEvent::Stream(StreamMessage {
            kind,
            generation,
            event,
        })
    }

    fn started(lines: &[&str]) -> StreamEvent {
        StreamEvent::Started {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            command: "jq -r '...' '/tmp/app.log'".into(),
        }
    }

    /// (kind, generation, group) of every queued start.
    fn starts(app: &mut App) -> Vec<(StreamKind, u64, String)> {
        app.take_commands()
            .into_iter()
            .filter_map(|c| match c {
                StreamCommand::Start {
                    kind,
                    generation,
                    params,
                } => Some((kind, generation, params.group)),
                StreamCommand::Cancel { .. } | StreamCommand::Stop => None,
            })
            .collect()
    }

    /// App with groups {error, info} loaded and content streaming.
    fn loaded_app() -> App {
        let mut app = test_app();
        app.start();
        app.apply_event(stream(StreamKind::Groups, 1, started(&["error", "info"])));
        app.apply_event(stream(StreamKind::Content, 1, started(&["a", "b"])));
        app.take_commands();
        app
    }

    fn focus(app: &mut App, target: Focus) {
        while app.focus != target {
            app.apply_event(AppEvent::FocusNext);
        }
    }

    #[test]
    fn test_start_runs_groups_first() {
        let mut app = test_app();
        app.start();
        let commands = app.take_commands();
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            StreamCommand::Start {
                kind,
                generation,
                params,
            } => {
                assert_eq!(*kind, StreamKind::Groups);
                assert_eq!(*generation, 1);
                assert_eq!(params.selector, ".level");
                assert_eq!(params.path, PathBuf::from("/tmp/app.log"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_groups_started_restarts_content() {
        let mut app = test_app();
        app.start();
        app.take_commands();

        app.apply_event(stream(StreamKind::Groups, 1, started(&["info", "error", "info"])));

        assert_eq!(app.groups.visible(), vec!["all", "error", "info"]);
        assert_eq!(
            starts(&mut app),
            vec![(StreamKind::Content, 1, "all".to_string())]
        );
    }

    #[test]
    fn test_selecting_group_restarts_only_content() {
        let mut app = loaded_app();
        focus(&mut app, Focus::Groups);

        app.apply_event(AppEvent::GroupNext);

        assert_eq!(
            starts(&mut app),
            vec![(StreamKind::Content, 2, "error".to_string())]
        );
    }

    #[test]
    fn test_group_keys_ignored_outside_group_pane() {
        let mut app = loaded_app();
        app.apply_event(AppEvent::GroupNext);
        assert!(app.take_commands().is_empty());
        assert_eq!(app.groups.selected(), "all");
    }

    #[test]
    fn test_format_edit_restarts_only_content() {
        let mut app = loaded_app();
        focus(&mut app, Focus::Format);

        app.apply_event(AppEvent::InputChar('x'));

        assert_eq!(app.format.value(), ".msgx");
        assert_eq!(
            starts(&mut app),
            vec![(StreamKind::Content, 2, "all".to_string())]
        );
    }

    #[test]
    fn test_selector_edit_restarts_groups() {
        let mut app = loaded_app();
        app.apply_event(AppEvent::InputBackspace);
        assert_eq!(app.selector.value(), ".leve");
        assert_eq!(
            starts(&mut app),
            vec![(StreamKind::Groups, 2, "all".to_string())]
        );
    }

    #[test]
    fn test_incomplete_selector_does_not_restart() {
        let mut app = loaded_app();
        app.apply_event(AppEvent::InputChar('.'));
        assert!(app.take_commands().is_empty());

        app.apply_event(AppEvent::InputChar('x'));
        assert_eq!(app.selector.value(), ".level.x");
        assert_eq!(starts(&mut app).len(), 1);
    }

    #[test]
    fn test_unchanged_value_does_not_restart() {
        let mut app = loaded_app();
        app.apply_event(AppEvent::InputDelete);
        app.apply_event(AppEvent::CursorLeft);
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn test_queued_starts_collapse_per_kind() {
        let mut app = loaded_app();
        for c in "abc".chars() {
            app.apply_event(AppEvent::InputChar(c));
        }
        assert_eq!(
            starts(&mut app),
            vec![(StreamKind::Groups, 4, "all".to_string())]
        );
    }

    #[test]
    fn test_stale_group_events_are_dropped() {
        let mut app = loaded_app();
        app.apply_event(AppEvent::InputBackspace);
        app.apply_event(AppEvent::InputChar('l'));
        app.take_commands();

        // Generation 1 was superseded twice.
        app.apply_event(stream(
            StreamKind::Groups,
            1,
            StreamEvent::GroupDiscovered("stale".into()),
        ));
        app.apply_event(stream(StreamKind::Groups, 2, started(&["older"])));
        assert_eq!(app.groups.visible(), vec!["all", "error", "info"]);

        app.apply_event(stream(StreamKind::Groups, 3, started(&["warn"])));
        assert_eq!(app.groups.visible(), vec!["all", "warn"]);
    }

    #[test]
    fn test_stale_content_events_are_dropped() {
        let mut app = loaded_app();
        focus(&mut app, Focus::Format);
        app.apply_event(AppEvent::InputChar('x'));

        app.apply_event(stream(StreamKind::Content, 1, StreamEvent::Line("old".into())));
        assert_eq!(app.output.raw_lines(), &["a".to_string(), "b".to_string()]);

        app.apply_event(stream(StreamKind::Content, 2, started(&["fresh"])));
        assert_eq!(app.output.raw_lines(), &["fresh".to_string()]);
    }

    #[test]
    fn test_selection_kept_across_group_restart() {
        let mut app = loaded_app();
        focus(&mut app, Focus::Groups);
        app.apply_event(AppEvent::GroupNext);
        focus(&mut app, Focus::Selector);
        app.apply_event(AppEvent::InputChar('x'));
        app.take_commands();

        app.apply_event(stream(StreamKind::Groups, 2, started(&["debug", "error"])));
        assert_eq!(app.groups.selected(), "error");

        app.apply_event(AppEvent::InputBackspace);
        app.take_commands();
        app.apply_event(stream(StreamKind::Groups, 3, started(&["debug"])));
        assert_eq!(app.groups.selected(), "all");
        assert_eq!(
            starts(&mut app),
            vec![(StreamKind::Content, 4, "all".to_string())]
        );
    }

    #[test]
    fn test_malformed_groups_fall_back_to_all() {
        let mut app = test_app();
        app.start();
        app.take_commands();

        app.apply_event(stream(StreamKind::Groups, 1, started(&[])));

        assert_eq!(app.groups.visible(), vec!["all"]);
        assert_eq!(starts(&mut app).len(), 1);
    }

    #[test]
    fn test_appended_lines_while_pinned() {
        let mut app = loaded_app();
        let before = app.output.rows().len();
        for i in 0..50 {
            app.apply_event(stream(
                StreamKind::Content,
                1,
                StreamEvent::Line(format!("live {}", i)),
            ));
        }
        assert_eq!(app.output.rows().len(), before + 50);
        assert!(app.output.is_pinned());
        assert_eq!(app.output.offset(), app.output.max_offset());
    }

    #[test]
    fn test_wrap_toggle_is_idempotent_and_keeps_raw() {
        let mut app = loaded_app();
        let long = "x".repeat(300);
        app.apply_event(stream(StreamKind::Content, 1, StreamEvent::Line(long)));
        focus(&mut app, Focus::Output);
        let raw = app.output.raw_lines().to_vec();
        let rows = app.output.rows().to_vec();

        app.apply_event(AppEvent::ToggleWrap);
        assert!(app.wrap());
        assert!(app.output.rows().len() > rows.len());
        assert_eq!(app.output.raw_lines(), raw.as_slice());

        app.apply_event(AppEvent::ToggleWrap);
        assert_eq!(app.output.rows(), rows.as_slice());
        assert_eq!(app.output.raw_lines(), raw.as_slice());
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn test_line_numbers_toggle_is_idempotent() {
        let mut app = loaded_app();
        focus(&mut app, Focus::Output);
        let rows = app.output.rows().to_vec();

        app.apply_event(AppEvent::ToggleLineNumbers);
        assert_eq!(app.output.rows()[0], "     1 a");
        app.apply_event(AppEvent::ToggleLineNumbers);
        assert_eq!(app.output.rows(), rows.as_slice());
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn test_resize_narrower_retruncates() {
        let mut app = loaded_app();
        let long = "y".repeat(200);
        app.apply_event(stream(StreamKind::Content, 1, StreamEvent::Line(long.clone())));
        let wide = app.output.rows()[2].len();

        app.apply_event(AppEvent::Resize {
            width: 60,
            height: 30,
        });

        let (width, _) = app.layout().output_inner();
        assert!(width < wide);
        assert_eq!(app.output.rows()[2].len(), width);
        assert_eq!(app.output.raw_lines()[2], long);
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn test_wider_group_reformats_output() {
        let mut app = loaded_app();
        let long = "z".repeat(200);
        app.apply_event(stream(StreamKind::Content, 1, StreamEvent::Line(long)));
        let before = app.output.rows()[2].len();

        app.apply_event(stream(
            StreamKind::Groups,
            1,
            StreamEvent::GroupDiscovered("a-group-name-of-thirty-chars!!".into()),
        ));

        assert_eq!(app.groups.width(), 34);
        assert_eq!(app.output.rows()[2].len(), before - (34 - 12));
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn test_content_error_shown_in_output() {
        let mut app = loaded_app();
        app.apply_event(stream(
            StreamKind::Content,
            1,
            StreamEvent::Error {
                message: "jq exit status: 3\njq: error: syntax error".into(),
                command: "jq -r 'bad' '/tmp/app.log'".into(),
            },
        ));
        assert_eq!(
            app.output.raw_lines(),
            &[
                "jq exit status: 3".to_string(),
                "jq: error: syntax error".to_string()
            ]
        );
        assert_eq!(app.command, "jq -r 'bad' '/tmp/app.log'");
        assert!(app.failed);
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn test_groups_error_shown_in_output_and_content_stopped() {
        let mut app = loaded_app();
        app.apply_event(stream(
            StreamKind::Groups,
            1,
            StreamEvent::Error {
                message: "jq exit status: 5\njq: error (at <stdin>:1): Cannot index string".into(),
                command: "jq -r '.|select(.level)|.level' '/tmp/app.log'".into(),
            },
        ));

        assert_eq!(app.groups.visible(), vec!["all"]);
        assert_eq!(
            app.output.raw_lines(),
            &[
                "jq exit status: 5".to_string(),
                "jq: error (at <stdin>:1): Cannot index string".to_string()
            ]
        );
        assert_eq!(app.command, "jq -r '.|select(.level)|.level' '/tmp/app.log'");
        assert!(app.failed);
        assert_eq!(
            app.take_commands(),
            vec![StreamCommand::Cancel {
                kind: StreamKind::Content
            }]
        );

        // A line from the cancelled content pipeline must not bury the error.
        app.apply_event(stream(StreamKind::Content, 1, StreamEvent::Line("c".into())));
        assert_eq!(app.output.raw_lines().len(), 2);

        // The next selector edit brings everything back.
        app.apply_event(AppEvent::InputChar('x'));
        assert_eq!(starts(&mut app), vec![(StreamKind::Groups, 2, "all".to_string())]);
        app.apply_event(stream(StreamKind::Groups, 2, started(&["info"])));
        app.apply_event(stream(StreamKind::Content, 3, started(&["d"])));
        assert!(!app.failed);
        assert_eq!(app.output.raw_lines(), &["d".to_string()]);
    }

    #[test]
    fn test_focus_cycles_and_wraps() {
        let mut app = test_app();
        app.apply_event(AppEvent::FocusPrev);
        assert_eq!(app.focus, Focus::Output);
        app.apply_event(AppEvent::FocusNext);
        assert_eq!(app.focus, Focus::Selector);
    }

    #[test]
    fn test_zoom_only_from_output_and_blocks_focus() {
        let mut app = loaded_app();
        app.apply_event(AppEvent::ToggleZoom);
        assert!(!app.zoomed);

        focus(&mut app, Focus::Output);
        app.apply_event(AppEvent::ToggleZoom);
        assert!(app.zoomed);
        assert_eq!(app.layout().groups, Rect::default());

        app.apply_event(AppEvent::FocusNext);
        assert_eq!(app.focus, Focus::Output);
    }

    #[test]
    fn test_escape_order() {
        let mut app = loaded_app();
        focus(&mut app, Focus::Groups);
        app.apply_event(AppEvent::StartGroupFilter);
        app.apply_event(AppEvent::GroupFilterChar('e'));
        focus(&mut app, Focus::Output);
        app.apply_event(AppEvent::ToggleZoom);

        // Zoom is undone first from the output pane.
        app.apply_event(AppEvent::Escape);
        assert!(!app.zoomed);
        assert!(app.take_commands().is_empty());

        focus(&mut app, Focus::Groups);
        app.apply_event(AppEvent::Escape);
        assert!(!app.groups.has_filter());
        assert!(app.take_commands().is_empty());

        app.apply_event(AppEvent::Escape);
        assert!(app.is_shutting_down());
        assert_eq!(app.take_commands(), vec![StreamCommand::Stop]);
        assert!(!app.should_quit);

        app.apply_event(AppEvent::ShutdownComplete);
        assert!(app.should_quit);
    }

    #[test]
    fn test_shutdown_sends_stop_once_and_blocks_restarts() {
        let mut app = loaded_app();
        app.apply_event(AppEvent::Shutdown);
        app.apply_event(AppEvent::Shutdown);
        app.apply_event(AppEvent::InputChar('x'));
        assert_eq!(app.take_commands(), vec![StreamCommand::Stop]);
    }

    #[test]
    fn test_jump_keys() {
        let mut app = loaded_app();
        for i in 0..100 {
            app.apply_event(stream(
                StreamKind::Content,
                1,
                StreamEvent::Line(format!("{}", i)),
            ));
        }
        focus(&mut app, Focus::Output);
        app.apply_event(AppEvent::JumpToTop);
        assert_eq!(app.output.offset(), 0);
        assert!(!app.output.is_pinned());

        app.apply_event(AppEvent::JumpToBottom);
        assert!(app.output.is_pinned());
    }
}
