//! Streaming pipelines of external filter processes.
//!
//! A pipeline replays the current contents of the watched file through the
//! filter tool, then keeps tailing the file and forwards every new line.
//! The [`coordinator`] owns at most one pipeline per [`StreamKind`].

pub mod cancel;
pub mod coordinator;
pub mod process;
pub mod runner;

use std::fmt;
use std::path::PathBuf;

/// The two independent streams the viewer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Formatted records of the selected group.
    Content,
    /// Distinct values of the grouping field.
    Groups,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Content => write!(f, "content"),
            StreamKind::Groups => write!(f, "groups"),
        }
    }
}

/// Events a pipeline produces, in the order it produces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The pipeline (re)started. `lines` is the replay burst reconstructed
    /// from file history; `command` is the equivalent shell command line.
    Started { lines: Vec<String>, command: String },
    /// One live content line.
    Line(String),
    /// One live group value.
    GroupDiscovered(String),
    /// The pipeline failed and stopped.
    Error { message: String, command: String },
    /// The pipeline terminated.
    Stopped,
}

/// A [`StreamEvent`] tagged with the pipeline instance that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    pub kind: StreamKind,
    pub generation: u64,
    pub event: StreamEvent,
}

/// Everything the coordinator delivers to the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    Stream(StreamMessage),
    /// Both pipelines confirmed termination after a stop request.
    ShutdownComplete,
}

/// Parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamParams {
    pub path: PathBuf,
    pub selector: String,
    pub format: String,
    pub group: String,
    /// Optional column-bounding stage appended after the filter.
    pub bound: Option<runner::ColumnBound>,
}

impl StreamParams {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            selector: String::new(),
            format: String::new(),
            group: crate::query::ALL_GROUP.to_string(),
            bound: None,
        }
    }
}
