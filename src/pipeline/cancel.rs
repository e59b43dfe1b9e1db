//! Cancellation scope of one pipeline instance.

use super::{CoordinatorEvent, StreamEvent, StreamKind, StreamMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

/// Stop flag shared by a pipeline thread and whoever superseded it.
///
/// All clones observe the same flag. The runner polls it between phases and
/// between lines; killing the children is what unblocks a pending read.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cancel-aware sender for one pipeline instance.
///
/// Sending and closing take the same fence, so once `close()` returns no
/// further event from this pipeline can be queued.
#[derive(Clone, Debug)]
pub struct EventGate {
    token: CancelToken,
    fence: Arc<Mutex<()>>,
    tx: Sender<CoordinatorEvent>,
    kind: StreamKind,
    generation: u64,
}

impl EventGate {
    pub fn new(
        token: CancelToken,
        tx: Sender<CoordinatorEvent>,
        kind: StreamKind,
        generation: u64,
    ) -> Self {
        Self {
            token,
            fence: Arc::new(Mutex::new(())),
            tx,
            kind,
            generation,
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Queue `event` unless the pipeline was cancelled.
    ///
    /// Returns false when the event was dropped (cancelled, or the receiver
    /// is gone), which tells the caller to stop producing.
    pub fn send(&self, event: StreamEvent) -> bool {
        let _fence = self.fence.lock().unwrap();
        if self.token.is_cancelled() {
            return false;
        }
        self.tx
            .send(CoordinatorEvent::Stream(StreamMessage {
                kind: self.kind,
                generation: self.generation,
                event,
            }))
            .is_ok()
    }

    /// Cancel the token, waiting out any send in progress.
    pub fn close(&self) {
        let _fence = self.fence.lock().unwrap();
        self.token.cancel();
    }
}
