//! Buffer standard input into a temporary file so it can be tailed like any
//! other growing file.

use anyhow::{Context, Result};
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const CLOSE_POLL_MS: u64 = 50;

/// A temp file fed from a reader on a background thread.
///
/// The file is removed when this is dropped.
pub struct StdinBuffer {
    file: NamedTempFile,
    closed: Arc<AtomicBool>,
}

impl StdinBuffer {
    pub fn spawn() -> Result<Self> {
        Self::from_reader(io::stdin())
    }

    pub fn from_reader<R: Read + Send + 'static>(mut reader: R) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("jlv-stdin-")
            .suffix(".jsonl")
            .tempfile()
            .context("Failed to create temp file for stdin")?;
        let mut writer = file.reopen().context("Failed to open stdin temp file")?;
        let closed = Arc::new(AtomicBool::new(false));

        let done = Arc::clone(&closed);
        thread::spawn(move || {
            match io::copy(&mut reader, &mut writer) {
                Ok(bytes) => debug!(bytes, "stdin closed"),
                Err(e) => warn!(error = %e, "copying stdin failed"),
            }
            done.store(true, Ordering::SeqCst);
        });

        Ok(Self { file, closed })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// True once the input reached EOF (or failed).
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Block until the input closes or `interrupt` is raised.
    pub fn wait_closed(&self, interrupt: &AtomicBool) {
        while !self.is_closed() && !interrupt.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(CLOSE_POLL_MS));
        }
    }
}
