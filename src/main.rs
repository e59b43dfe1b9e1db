mod app;
mod config;
mod format;
mod handlers;
mod logging;
mod pipeline;
mod query;
mod signal;
mod stdin;
mod stream_mode;
mod tui;

use anyhow::{Context, Result};
use app::{App, AppEvent, AppSettings};
use clap::Parser;
use colored::Colorize;
use config::ConfigError;
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pipeline::coordinator::Coordinator;
use pipeline::runner::{ColumnBound, PipelineRunner};
use pipeline::{CoordinatorEvent, StreamParams};
use ratatui::{backend::CrosstermBackend, Terminal};
use signal::ShutdownSignal;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use stdin::StdinBuffer;
use tracing::info;

// Constants
const INPUT_POLL_DURATION_MS: u64 = 100;
const MAX_STREAM_EVENTS_PER_FRAME: usize = 5000;

#[derive(Parser, Debug)]
#[command(name = "jlv")]
#[command(about = "Interactive viewer for growing newline-delimited JSON files", long_about = None)]
struct Args {
    /// File to view (use - for stdin)
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Field used to group records, e.g. .level
    #[arg(short, long)]
    selector: Option<String>,

    /// Expression producing the displayed value, e.g. .msg
    #[arg(short = 'o', long = "output", value_name = "FORMAT")]
    format: Option<String>,

    /// Show line numbers
    #[arg(short = 'l', long = "linenumbers")]
    line_numbers: bool,

    /// Wrap long lines instead of truncating them
    #[arg(short, long)]
    wrap: bool,

    /// Group to print in --stream mode
    #[arg(short, long, default_value = query::ALL_GROUP)]
    group: String,

    /// Print the formatted stream to stdout instead of opening the viewer
    #[arg(long)]
    stream: bool,

    /// Bound --stream output to this many columns
    #[arg(long, requires = "stream")]
    width: Option<usize>,

    /// Config file (default: nearest jlv.yaml, then the user config dir)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Append diagnostic logs to this file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        match err.downcast_ref::<ConfigError>() {
            Some(config_err) => eprint!("{}", config_err),
            None => eprintln!("{} {:#}", "error:".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let config_path = config::discover(args.config.as_deref());
    let config = config::load(config_path.as_deref())?;
    let log_file = args.log.clone().or_else(|| config.log_file.clone());
    logging::init(log_file.as_deref())?;
    info!(config = ?config.path, tool = %config.filter_tool, "starting");

    let signal = ShutdownSignal::install().context("Failed to install signal handlers")?;

    // Buffer stdin before anything touches the terminal.
    let stdin_buffer = if args.path.as_os_str() == "-" {
        Some(StdinBuffer::spawn()?)
    } else {
        None
    };
    let path = match &stdin_buffer {
        Some(buffer) => buffer.path().to_path_buf(),
        None => args.path.clone(),
    };
    let metadata = std::fs::metadata(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }
    if !pipeline::process::program_available(&config.filter_tool) {
        anyhow::bail!("filter tool `{}` was not found on PATH", config.filter_tool);
    }

    let selector = args
        .selector
        .clone()
        .or_else(|| config.selector.clone())
        .unwrap_or_default();
    let format = args
        .format
        .clone()
        .or_else(|| config.format.clone())
        .unwrap_or_default();
    let wrap = args.wrap || config.wrap;
    let line_numbers = args.line_numbers || config.line_numbers;
    let runner = PipelineRunner::new(config.filter_tool.clone());

    let result = if args.stream {
        let mut params = StreamParams::new(&path);
        params.selector = selector;
        params.format = format;
        params.group = args.group.clone();
        params.bound = args.width.map(|width| {
            if wrap {
                ColumnBound::Wrap(width)
            } else {
                ColumnBound::Truncate(width)
            }
        });
        let stdout = io::stdout();
        let mut out = stdout.lock();
        stream_mode::run(runner, params, &mut out, signal.flag())
    } else {
        let settings = AppSettings {
            selector,
            format,
            wrap,
            line_numbers,
            list_min_width: config.list_min_width,
            list_max_width: config.list_max_width,
        };
        run_tui(runner, path, settings, &signal)
    };

    if let Some(buffer) = &stdin_buffer {
        if !buffer.is_closed() {
            eprintln!("Stdin may not be closed. Ctrl-C to exit.");
            buffer.wait_closed(signal.flag());
        }
    }

    info!(ok = result.is_ok(), "exiting");
    result
}

fn run_tui(
    runner: PipelineRunner,
    path: PathBuf,
    settings: AppSettings,
    signal: &ShutdownSignal,
) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, runner, path, settings, signal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    runner: PipelineRunner,
    path: PathBuf,
    settings: AppSettings,
    signal: &ShutdownSignal,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(path, settings, size.width, size.height);

    let (tx, rx) = mpsc::channel();
    let coordinator = Coordinator::spawn(runner, tx);
    app.start();

    let mut busy = false;
    loop {
        for command in app.take_commands() {
            coordinator.send(command);
        }
        if app.should_quit {
            break;
        }

        terminal.draw(|f| tui::render(f, &app))?;

        let mut events = Vec::new();

        if signal.is_raised() && !app.is_shutting_down() {
            events.push(AppEvent::Shutdown);
        }

        // Don't sleep on input while pipeline events are backing up
        let poll = if busy { 0 } else { INPUT_POLL_DURATION_MS };
        if crossterm_event::poll(Duration::from_millis(poll))? {
            match crossterm_event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    events.extend(handlers::input::handle_input_event(key, &app));
                }
                Event::Resize(width, height) => events.push(AppEvent::Resize { width, height }),
                _ => {}
            }
        }

        let before = events.len();
        events.extend(
            rx.try_iter()
                .take(MAX_STREAM_EVENTS_PER_FRAME)
                .map(|event| match event {
                    CoordinatorEvent::Stream(message) => AppEvent::Stream(message),
                    CoordinatorEvent::ShutdownComplete => AppEvent::ShutdownComplete,
                }),
        );
        busy = events.len() - before == MAX_STREAM_EVENTS_PER_FRAME;

        for event in events {
            app.apply_event(event);
        }
    }

    coordinator.join();
    Ok(())
}
