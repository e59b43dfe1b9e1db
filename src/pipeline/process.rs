//! Child-process plumbing: stage descriptors, chain spawning and the kill
//! registry every pipeline owns.

use std::fmt;
use std::io::{self, Read};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Poll interval while waiting for a registered child to exit.
const WAIT_POLL_MS: u64 = 5;

/// One external program in a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment for this stage only.
    pub env: Vec<(String, String)>,
}

impl Stage {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-like rendering for diagnostics.
    pub fn command_line(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || "'\"|&;$*?()".contains(c)) {
                out.push('\'');
                out.push_str(&arg.replace('\'', r"'\''"));
                out.push('\'');
            } else {
                out.push_str(arg);
            }
        }
        out
    }
}

/// Render a whole chain as `a | b | c`.
pub fn chain_command_line(stages: &[Stage]) -> String {
    stages
        .iter()
        .map(Stage::command_line)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Failures of the external tools a pipeline drives.
#[derive(Debug)]
pub enum ToolError {
    /// The program could not be launched (missing binary, permissions).
    Start { program: String, source: io::Error },
    /// The program exited unsuccessfully.
    Runtime {
        program: String,
        status: ExitStatus,
        output: String,
    },
    /// Reading the program's output failed.
    Io { program: String, source: io::Error },
    /// The pipeline was cancelled; not reported to the user.
    Cancelled,
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Start { program, source } => {
                write!(f, "failed to start {}: {}", program, source)
            }
            ToolError::Runtime {
                program,
                status,
                output,
            } => {
                write!(f, "{} {}", program, status)?;
                let output = output.trim_end();
                if !output.is_empty() {
                    write!(f, "\n{}", output)?;
                }
                Ok(())
            }
            ToolError::Io { program, source } => {
                write!(f, "failed to read output of {}: {}", program, source)
            }
            ToolError::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Start { source, .. } | ToolError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

struct Registered {
    id: usize,
    program: String,
    child: Child,
    status: Option<ExitStatus>,
}

#[derive(Default)]
struct ProcessSetInner {
    children: Vec<Registered>,
    next_id: usize,
    closed: bool,
}

/// Registry of every child a pipeline spawned.
///
/// `kill_all` closes the set: children registered afterwards are killed on
/// arrival, so a pipeline racing its own cancellation cannot leak a process.
#[derive(Clone, Default)]
pub struct ProcessSet {
    inner: Arc<Mutex<ProcessSetInner>>,
}

impl ProcessSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `child`. Fails with `Cancelled` if the set is closed.
    pub fn register(&self, program: &str, mut child: Child) -> Result<usize, ToolError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            drop(inner);
            if let Err(e) = child.kill() {
                warn!(program, error = %e, "kill of late child failed");
            }
            let _ = child.wait();
            return Err(ToolError::Cancelled);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.children.push(Registered {
            id,
            program: program.to_string(),
            child,
            status: None,
        });
        Ok(id)
    }

    /// Number of children currently registered and not yet reaped.
    #[cfg(test)]
    pub fn live(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .children
            .iter()
            .filter(|r| r.status.is_none())
            .count()
    }

    /// Wait for child `id` to exit. Returns `None` if the set was closed
    /// (the child is then reaped by `kill_all`).
    pub fn wait(&self, id: usize) -> Option<ExitStatus> {
        loop {
            {
                let mut inner = self.inner.lock().unwrap();
                if inner.closed {
                    return None;
                }
                let entry = inner.children.iter_mut().find(|r| r.id == id)?;
                if let Some(status) = entry.status {
                    return Some(status);
                }
                match entry.child.try_wait() {
                    Ok(Some(status)) => {
                        entry.status = Some(status);
                        return Some(status);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(program = %entry.program, error = %e, "try_wait failed");
                        return None;
                    }
                }
            }
            thread::sleep(Duration::from_millis(WAIT_POLL_MS));
        }
    }

    /// Kill and reap every child, closing the set.
    ///
    /// A failed kill (usually a child that already exited) is logged and
    /// does not stop the remaining children from being killed. Returns the
    /// number of failed kills.
    pub fn kill_all(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        let mut failures = 0;
        for entry in inner.children.iter_mut() {
            if entry.status.is_some() {
                continue;
            }
            if let Err(e) = entry.child.kill() {
                failures += 1;
                warn!(program = %entry.program, error = %e, "kill failed");
            }
            match entry.child.wait() {
                Ok(status) => entry.status = Some(status),
                Err(e) => warn!(program = %entry.program, error = %e, "wait after kill failed"),
            }
        }
        failures
    }
}

/// A spawned chain: the last stage's stdout plus stderr collectors.
pub struct Chain {
    pub stdout: ChildStdout,
    stages: Vec<SpawnedStage>,
}

struct SpawnedStage {
    id: usize,
    program: String,
    stderr: Option<JoinHandle<String>>,
}

impl Chain {
    /// After the final stdout reached EOF: wait the stages from last to
    /// first and report the first failure.
    ///
    /// A stage that exited successfully implies its upstream closed the
    /// pipe, so waiting on the upstream cannot hang. A failed stage stops
    /// the walk; upstream stages are left to `kill_all`.
    pub fn finish(mut self, set: &ProcessSet) -> Result<(), ToolError> {
        for stage in self.stages.iter_mut().rev() {
            let Some(status) = set.wait(stage.id) else {
                return Err(ToolError::Cancelled);
            };
            if !status.success() {
                let output = stage
                    .stderr
                    .take()
                    .and_then(|h| h.join().ok())
                    .unwrap_or_default();
                return Err(ToolError::Runtime {
                    program: stage.program.clone(),
                    status,
                    output,
                });
            }
        }
        Ok(())
    }
}

/// Spawn `stages`, wiring stdout of stage i to stdin of stage i+1.
///
/// Every child is registered in `set` before the next one starts.
pub fn spawn_chain(stages: &[Stage], set: &ProcessSet) -> Result<Chain, ToolError> {
    let mut upstream: Option<ChildStdout> = None;
    let mut spawned = Vec::with_capacity(stages.len());

    debug!(chain = %chain_command_line(stages), "spawning chain");
    for stage in stages {
        let stdin = match upstream.take() {
            Some(out) => Stdio::from(out),
            None => Stdio::null(),
        };
        let mut child = Command::new(&stage.program)
            .args(&stage.args)
            .envs(stage.env.iter().map(|(k, v)| (k, v)))
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Start {
                program: stage.program.clone(),
                source,
            })?;
        debug!(command = %stage.command_line(), pid = child.id(), "spawned stage");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take().map(spawn_stderr_pump);
        let id = set.register(&stage.program, child)?;

        upstream = Some(stdout.ok_or_else(|| ToolError::Io {
            program: stage.program.clone(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "stdout not captured"),
        })?);
        spawned.push(SpawnedStage {
            id,
            program: stage.program.clone(),
            stderr,
        });
    }

    let stdout = upstream.ok_or_else(|| ToolError::Io {
        program: String::new(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "empty chain"),
    })?;
    Ok(Chain {
        stdout,
        stages: spawned,
    })
}

fn spawn_stderr_pump<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Returns true if `program` can be found on `PATH`.
pub fn program_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
