//! Two-phase read of a growing file through the filter tool.
//!
//! Phase one counts the newline-terminated lines currently in the file and
//! replays exactly that many through the filter as one burst. Phase two
//! tails the file from the next line on and forwards every filtered line as
//! it arrives. The tail starts strictly after the counted line, so no line
//! is lost or delivered twice across the switch.

use super::cancel::EventGate;
use super::process::{spawn_chain, ProcessSet, Stage, ToolError};
use super::{StreamEvent, StreamKind, StreamParams};
use crate::query;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Widest bound the sed stage supports (POSIX `RE_DUP_MAX`).
pub const MAX_BOUND_WIDTH: usize = 255;

/// Narrowest bound; leaves room for the ellipsis plus one character.
pub const MIN_BOUND_WIDTH: usize = 4;

const ELLIPSIS: &str = "...";
/// Makes `.{N}` in the sed stage count characters rather than bytes.
const UTF8_LOCALE: &str = "C.UTF-8";
const COUNT_BUFFER_SIZE: usize = 64 * 1024;

/// Column-bounding stage appended after the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnBound {
    /// Cut lines longer than the width, ending them with `...`.
    Truncate(usize),
    /// Break lines every `width` characters.
    Wrap(usize),
}

impl ColumnBound {
    /// Requested width clamped to what the stage supports.
    pub fn width(&self) -> usize {
        let requested = match self {
            ColumnBound::Truncate(w) | ColumnBound::Wrap(w) => *w,
        };
        requested.clamp(MIN_BOUND_WIDTH, MAX_BOUND_WIDTH)
    }

    pub fn stage(&self) -> Stage {
        let width = self.width();
        let sed = Stage::new("sed")
            .env("LC_ALL", UTF8_LOCALE)
            .arg("-u")
            .arg("-E");
        match self {
            ColumnBound::Truncate(_) => {
                let keep = width - ELLIPSIS.len();
                sed.arg("-e").arg(format!(
                    "s/^(.{{{keep}}}).{{{},}}$/\\1{ELLIPSIS}/",
                    ELLIPSIS.len() + 1
                ))
            }
            ColumnBound::Wrap(_) => sed
                .arg("-e")
                .arg(format!("s/.{{{width}}}/&\\n/g"))
                .arg("-e")
                .arg("s/\\n$//"),
        }
    }
}

/// Count newline-terminated lines with a single byte scan.
pub fn count_lines(path: &Path) -> io::Result<usize> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; COUNT_BUFFER_SIZE];
    let mut count = 0;
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => return Ok(count),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        count += memchr::memchr_iter(b'\n', &buf[..n]).count();
    }
}

/// Whether a groups line is unusable as a group name.
///
/// A content sniff: empty lines and lines opening a JSON object or array
/// mean the selector yields structured values, not scalars. Legitimate
/// string values starting with `{` or `[` are rejected too.
pub fn looks_like_json_fragment(line: &str) -> bool {
    line.is_empty() || line.starts_with('{') || line.starts_with('[')
}

/// Runs pipelines with a given filter tool.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    tool: String,
}

impl PipelineRunner {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// Run one pipeline to completion on the calling thread.
    ///
    /// Returns when the pipeline is cancelled, fails, or its live tail ends.
    /// Every child is killed before returning, on every path.
    pub fn run(&self, params: &StreamParams, gate: &EventGate, processes: &ProcessSet) {
        if !gate.token().is_cancelled() {
            match gate.kind() {
                StreamKind::Content => self.run_content(params, gate, processes),
                StreamKind::Groups => self.run_groups(params, gate, processes),
            }
        }
        processes.kill_all();
    }

    fn run_content(&self, params: &StreamParams, gate: &EventGate, processes: &ProcessSet) {
        let query = query::build_content_query(&params.selector, &params.group, &params.format);
        let command = self.command_line(&query, &params.path);
        let bound = params.bound.map(|b| b.stage());

        let (replayed, lines) =
            match self.replay(&query, &params.path, bound.clone(), processes) {
                Ok(result) => result,
                Err(err) => return report(gate, err, command),
            };
        info!(kind = %gate.kind(), generation = gate.generation(), replayed, burst = lines.len(), %command, "replay complete");
        if !gate.send(StreamEvent::Started {
            lines,
            command: command.clone(),
        }) {
            return;
        }

        let outcome = self.tail(&query, &params.path, replayed, bound, gate, processes, |line| {
            gate.send(StreamEvent::Line(line))
        });
        finish(gate, outcome, command);
    }

    fn run_groups(&self, params: &StreamParams, gate: &EventGate, processes: &ProcessSet) {
        let query = query::build_groups_query(&params.selector);
        let command = self.command_line(&query, &params.path);

        let (replayed, lines) = match self.replay(&query, &params.path, None, processes) {
            Ok(result) => result,
            Err(err) => return report(gate, err, command),
        };

        if lines.iter().any(|l| looks_like_json_fragment(l)) {
            debug!(selector = %params.selector, "groups burst looks like JSON, falling back to ungrouped");
            gate.send(StreamEvent::Started {
                lines: Vec::new(),
                command,
            });
            gate.close();
            return;
        }

        let burst: BTreeSet<String> = lines.into_iter().collect();
        let mut seen: HashSet<String> = burst.iter().cloned().collect();
        if !gate.send(StreamEvent::Started {
            lines: burst.into_iter().collect(),
            command: command.clone(),
        }) {
            return;
        }

        let outcome = self.tail(&query, &params.path, replayed, None, gate, processes, |line| {
            if looks_like_json_fragment(&line) {
                debug!(selector = %params.selector, "live group looks like JSON, cancelling groups");
                gate.send(StreamEvent::Started {
                    lines: Vec::new(),
                    command: command.clone(),
                });
                gate.close();
                return false;
            }
            if !seen.insert(line.clone()) {
                return true;
            }
            gate.send(StreamEvent::GroupDiscovered(line))
        });
        finish(gate, outcome, command);
    }

    /// Replay the first `count_lines(path)` lines through the filter.
    fn replay(
        &self,
        query: &str,
        path: &Path,
        bound: Option<Stage>,
        processes: &ProcessSet,
    ) -> Result<(usize, Vec<String>), ToolError> {
        let count = count_lines(path).map_err(|source| ToolError::Io {
            program: format!("count lines of {}", path.display()),
            source,
        })?;
        if count == 0 {
            return Ok((0, Vec::new()));
        }

        let mut stages = vec![
            Stage::new("head")
                .arg("-n")
                .arg(count.to_string())
                .arg(path.display().to_string()),
            Stage::new(&self.tool).arg("-r").arg(query),
        ];
        stages.extend(bound);

        let mut chain = spawn_chain(&stages, processes)?;
        let mut buf = Vec::new();
        chain
            .stdout
            .read_to_end(&mut buf)
            .map_err(|source| ToolError::Io {
                program: self.tool.clone(),
                source,
            })?;
        chain.finish(processes)?;

        let text = String::from_utf8_lossy(&buf);
        let text = text.trim_end_matches('\n');
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        Ok((count, lines))
    }

    /// Follow the file from line `replayed + 1`, handing each filtered line
    /// to `emit` until it returns false or the stream ends.
    #[allow(clippy::too_many_arguments)]
    fn tail<F>(
        &self,
        query: &str,
        path: &Path,
        replayed: usize,
        bound: Option<Stage>,
        gate: &EventGate,
        processes: &ProcessSet,
        mut emit: F,
    ) -> Result<(), ToolError>
    where
        F: FnMut(String) -> bool,
    {
        let mut stages = vec![
            Stage::new("tail")
                .arg("-f")
                .arg("-n")
                .arg(format!("+{}", replayed + 1))
                .arg(path.display().to_string()),
            Stage::new(&self.tool)
                .arg("-r")
                .arg("--unbuffered")
                .arg(query),
        ];
        stages.extend(bound);

        let mut chain = spawn_chain(&stages, processes)?;
        debug!(kind = %gate.kind(), generation = gate.generation(), from = replayed + 1, "live tail started");

        // Decoded lossily like the replay burst, so a line never renders in
        // one phase and fails the pipeline in the other.
        let mut reader = BufReader::new(&mut chain.stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| ToolError::Io {
                    program: self.tool.clone(),
                    source,
                })?;
            if n == 0 {
                break;
            }
            if gate.token().is_cancelled() {
                return Err(ToolError::Cancelled);
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            if !emit(String::from_utf8_lossy(&buf).into_owned()) {
                return Err(ToolError::Cancelled);
            }
        }

        if gate.token().is_cancelled() {
            return Err(ToolError::Cancelled);
        }
        chain.finish(processes)
    }

    fn command_line(&self, query: &str, path: &Path) -> String {
        query::command_line(&self.tool, query, &path.display().to_string())
    }
}

fn report(gate: &EventGate, err: ToolError, command: String) {
    if matches!(err, ToolError::Cancelled) {
        return;
    }
    info!(kind = %gate.kind(), generation = gate.generation(), error = %err, "pipeline failed");
    gate.send(StreamEvent::Error {
        message: err.to_string(),
        command,
    });
}

fn finish(gate: &EventGate, outcome: Result<(), ToolError>, command: String) {
    match outcome {
        Ok(()) => {
            gate.send(StreamEvent::Stopped);
        }
        Err(err) => report(gate, err, command),
    }
}
