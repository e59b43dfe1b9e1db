//! Headless mode: run the content pipeline and print every line to stdout.

use crate::pipeline::coordinator::{Coordinator, StreamCommand};
use crate::pipeline::runner::PipelineRunner;
use crate::pipeline::{CoordinatorEvent, StreamEvent, StreamKind, StreamParams};
use anyhow::{bail, Result};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info};

const POLL_INTERVAL_MS: u64 = 100;

/// Stream until `stop` is raised, the pipeline ends, or `out` is closed.
pub fn run<W: Write>(
    runner: PipelineRunner,
    params: StreamParams,
    out: &mut W,
    stop: &AtomicBool,
) -> Result<()> {
    let (tx, rx) = channel();
    let coordinator = Coordinator::spawn(runner, tx);
    coordinator.send(StreamCommand::Start {
        kind: StreamKind::Content,
        generation: 1,
        params,
    });

    let mut stopping = false;
    let mut failure = None;
    loop {
        if !stopping && stop.load(Ordering::SeqCst) {
            info!("stop requested");
            coordinator.send(StreamCommand::Stop);
            stopping = true;
        }

        let event = match rx.recv_timeout(Duration::from_millis(POLL_INTERVAL_MS)) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let written = match event {
            CoordinatorEvent::ShutdownComplete => break,
            CoordinatorEvent::Stream(message) => match message.event {
                StreamEvent::Started { lines, command } => {
                    debug!(%command, burst = lines.len(), "stream started");
                    write_lines(out, &lines)
                }
                StreamEvent::Line(line) => write_lines(out, std::slice::from_ref(&line)),
                StreamEvent::Error { message, command } => {
                    failure = Some(format!("{}\n  command: {}", message.trim_end(), command));
                    Err(io::ErrorKind::Other.into())
                }
                StreamEvent::Stopped => Err(io::ErrorKind::UnexpectedEof.into()),
                StreamEvent::GroupDiscovered(_) => Ok(()),
            },
        };

        if let Err(e) = written {
            if e.kind() == io::ErrorKind::BrokenPipe {
                debug!("stdout closed");
            }
            if !stopping {
                coordinator.send(StreamCommand::Stop);
                stopping = true;
            }
        }
    }

    coordinator.join();
    if let Some(failure) = failure {
        bail!(failure);
    }
    Ok(())
}

fn write_lines<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}
