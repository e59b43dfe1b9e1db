//! Owns at most one running pipeline per [`StreamKind`].
//!
//! Commands arrive one at a time on a channel and are applied by a single
//! coordinator thread, so the two slots need no locking. Starting a kind
//! closes the old pipeline's gate and kills its children before the new
//! pipeline is spawned.

use super::cancel::{CancelToken, EventGate};
use super::process::ProcessSet;
use super::runner::PipelineRunner;
use super::{CoordinatorEvent, StreamKind, StreamParams};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Requests the UI sends to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamCommand {
    /// Replace the pipeline of `kind` with a fresh one.
    Start {
        kind: StreamKind,
        generation: u64,
        params: StreamParams,
    },
    /// Cancel the pipeline of `kind`, leaving its slot empty.
    Cancel { kind: StreamKind },
    /// Cancel both pipelines and report `ShutdownComplete` once they ended.
    Stop,
}

/// Count of live pipelines per kind, plus the highest count ever seen.
#[derive(Clone, Default, Debug)]
pub struct RunningGauge {
    running: Arc<[AtomicUsize; 2]>,
    peak: Arc<[AtomicUsize; 2]>,
}

impl RunningGauge {
    fn slot(kind: StreamKind) -> usize {
        match kind {
            StreamKind::Content => 0,
            StreamKind::Groups => 1,
        }
    }

    pub fn running(&self, kind: StreamKind) -> usize {
        self.running[Self::slot(kind)].load(Ordering::SeqCst)
    }

    pub fn peak(&self, kind: StreamKind) -> usize {
        self.peak[Self::slot(kind)].load(Ordering::SeqCst)
    }

    fn acquire(&self, kind: StreamKind) {
        let i = Self::slot(kind);
        let now = self.running[i].fetch_add(1, Ordering::SeqCst) + 1;
        self.peak[i].fetch_max(now, Ordering::SeqCst);
    }

    fn release(&self, kind: StreamKind) {
        self.running[Self::slot(kind)].fetch_sub(1, Ordering::SeqCst);
    }
}

/// Releases a pipeline's gauge entry exactly once, whichever side ends it.
#[derive(Clone)]
struct Lease {
    kind: StreamKind,
    gauge: RunningGauge,
    held: Arc<AtomicBool>,
}

impl Lease {
    fn acquire(kind: StreamKind, gauge: &RunningGauge) -> Self {
        gauge.acquire(kind);
        Self {
            kind,
            gauge: gauge.clone(),
            held: Arc::new(AtomicBool::new(true)),
        }
    }

    fn release(&self) {
        if self.held.swap(false, Ordering::SeqCst) {
            self.gauge.release(self.kind);
        }
    }
}

struct Slot {
    gate: EventGate,
    processes: ProcessSet,
    lease: Lease,
    handle: JoinHandle<()>,
}

impl Slot {
    /// Stop the pipeline: no event is queued after this returns.
    fn cancel(self) -> JoinHandle<()> {
        self.gate.close();
        let failed = self.processes.kill_all();
        if failed > 0 {
            warn!(kind = %self.gate.kind(), generation = self.gate.generation(), failed, "some children could not be killed");
        }
        self.lease.release();
        debug!(kind = %self.gate.kind(), generation = self.gate.generation(), "pipeline cancelled");
        self.handle
    }
}

struct Worker {
    runner: Arc<PipelineRunner>,
    events: Sender<CoordinatorEvent>,
    gauge: RunningGauge,
    content: Option<Slot>,
    groups: Option<Slot>,
    retired: Vec<JoinHandle<()>>,
}

impl Worker {
    fn slot_mut(&mut self, kind: StreamKind) -> &mut Option<Slot> {
        match kind {
            StreamKind::Content => &mut self.content,
            StreamKind::Groups => &mut self.groups,
        }
    }

    fn run(mut self, commands: Receiver<StreamCommand>) {
        while let Ok(command) = commands.recv() {
            match command {
                StreamCommand::Start {
                    kind,
                    generation,
                    params,
                } => self.start(kind, generation, params),
                StreamCommand::Cancel { kind } => self.cancel(kind),
                StreamCommand::Stop => {
                    self.stop();
                    // Exactly one confirmation; later commands go nowhere.
                    let _ = self.events.send(CoordinatorEvent::ShutdownComplete);
                    info!(
                        content_peak = self.gauge.peak(StreamKind::Content),
                        groups_peak = self.gauge.peak(StreamKind::Groups),
                        "coordinator stopped"
                    );
                    return;
                }
            }
        }
        debug!("command channel closed, cancelling pipelines");
        self.stop();
    }

    fn cancel(&mut self, kind: StreamKind) {
        if let Some(old) = self.slot_mut(kind).take() {
            let handle = old.cancel();
            self.retired.push(handle);
        }
        self.retired.retain(|h| !h.is_finished());
    }

    fn start(&mut self, kind: StreamKind, generation: u64, params: StreamParams) {
        self.cancel(kind);

        let gate = EventGate::new(CancelToken::new(), self.events.clone(), kind, generation);
        let processes = ProcessSet::new();
        debug_assert_eq!(self.gauge.running(kind), 0, "{} slot still running", kind);
        let lease = Lease::acquire(kind, &self.gauge);
        info!(%kind, generation, selector = %params.selector, format = %params.format, group = %params.group, "starting pipeline");

        let handle = {
            let runner = Arc::clone(&self.runner);
            let gate = gate.clone();
            let processes = processes.clone();
            let lease = lease.clone();
            thread::spawn(move || {
                runner.run(&params, &gate, &processes);
                lease.release();
                debug!(kind = %gate.kind(), generation = gate.generation(), "pipeline thread finished");
            })
        };

        *self.slot_mut(kind) = Some(Slot {
            gate,
            processes,
            lease,
            handle,
        });
    }

    /// Cancel both slots and wait for every pipeline thread to end.
    fn stop(&mut self) {
        for kind in [StreamKind::Content, StreamKind::Groups] {
            if let Some(slot) = self.slot_mut(kind).take() {
                let handle = slot.cancel();
                self.retired.push(handle);
            }
        }
        for handle in self.retired.drain(..) {
            if handle.join().is_err() {
                warn!("pipeline thread panicked");
            }
        }
    }
}

/// Handle to the coordinator thread.
pub struct Coordinator {
    commands: Sender<StreamCommand>,
    #[cfg(test)]
    gauge: RunningGauge,
    handle: Option<JoinHandle<()>>,
}

impl Coordinator {
    /// Spawn the coordinator; every stream event goes to `events`.
    pub fn spawn(runner: PipelineRunner, events: Sender<CoordinatorEvent>) -> Self {
        let (commands, rx) = channel();
        let gauge = RunningGauge::default();
        let worker = Worker {
            runner: Arc::new(runner),
            events,
            gauge: gauge.clone(),
            content: None,
            groups: None,
            retired: Vec::new(),
        };
        let handle = thread::spawn(move || worker.run(rx));
        Self {
            commands,
            #[cfg(test)]
            gauge,
            handle: Some(handle),
        }
    }

    pub fn send(&self, command: StreamCommand) {
        if self.commands.send(command).is_err() {
            debug!("coordinator already stopped, command dropped");
        }
    }

    #[cfg(test)]
    pub fn gauge(&self) -> RunningGauge {
        self.gauge.clone()
    }

    /// Stop the pipelines, unless already requested, and wait for the thread.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // The worker returns after the first Stop; a second one is never read.
        let _ = self.commands.send(StreamCommand::Stop);
        if handle.join().is_err() {
            warn!("coordinator thread panicked");
        }
    }
}

/// Early returns from the UI loop still kill every child process.
impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::process::program_available;
    use crate::pipeline::{StreamEvent, StreamMessage};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    const RECV_TIMEOUT: Duration = Duration::from_secs(10);

    fn sample_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"level":"info","msg":"started"}}"#).unwrap();
        writeln!(file, r#"{{"level":"error","msg":"boom"}}"#).unwrap();
        writeln!(file, r#"{{"level":"info","msg":"done"}}"#).unwrap();
        file.flush().unwrap();
        file
    }

    fn params(file: &NamedTempFile, selector: &str) -> StreamParams {
        let mut params = StreamParams::new(file.path());
        params.selector = selector.to_string();
        params
    }

    fn wait_shutdown(rx: &Receiver<CoordinatorEvent>) -> Vec<StreamMessage> {
        let mut seen = Vec::new();
        loop {
            match rx.recv_timeout(RECV_TIMEOUT).expect("no shutdown in time") {
                CoordinatorEvent::ShutdownComplete => return seen,
                CoordinatorEvent::Stream(msg) => seen.push(msg),
            }
        }
    }

    #[test]
    fn test_stop_with_empty_slots_confirms_once() {
        let (tx, rx) = channel();
        let coordinator = Coordinator::spawn(PipelineRunner::new("jq"), tx);

        coordinator.send(StreamCommand::Stop);
        coordinator.send(StreamCommand::Stop);

        assert!(wait_shutdown(&rx).is_empty());
        coordinator.join();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_start_failure_surfaces_as_error() {
        let file = sample_file();
        let (tx, rx) = channel();
        let coordinator = Coordinator::spawn(PipelineRunner::new("jlv-no-such-filter-tool"), tx);

        coordinator.send(StreamCommand::Start {
            kind: StreamKind::Content,
            generation: 4,
            params: params(&file, ""),
        });

        match rx.recv_timeout(RECV_TIMEOUT).unwrap() {
            CoordinatorEvent::Stream(StreamMessage {
                kind,
                generation,
                event,
            }) => {
                assert_eq!(kind, StreamKind::Content);
                assert_eq!(generation, 4);
                assert!(matches!(event, StreamEvent::Error { .. }));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        coordinator.send(StreamCommand::Stop);
        wait_shutdown(&rx);
        coordinator.join();
    }

    #[test]
    fn test_restarts_keep_one_pipeline_per_kind() {
        if !program_available("jq") {
            eprintln!("skipping: jq not found on PATH");
            return;
        }
        let file = sample_file();
        let (tx, rx) = channel();
        let coordinator = Coordinator::spawn(PipelineRunner::new("jq"), tx);
        let gauge = coordinator.gauge();

        for generation in 1..=5 {
            for kind in [StreamKind::Content, StreamKind::Groups] {
                coordinator.send(StreamCommand::Start {
                    kind,
                    generation,
                    params: params(&file, ".level"),
                });
            }
        }
        coordinator.send(StreamCommand::Stop);
        let messages = wait_shutdown(&rx);
        coordinator.join();

        assert_eq!(gauge.peak(StreamKind::Content), 1);
        assert_eq!(gauge.peak(StreamKind::Groups), 1);
        assert_eq!(gauge.running(StreamKind::Content), 0);
        assert_eq!(gauge.running(StreamKind::Groups), 0);

        // Per kind, generations never go backwards in the queue.
        for kind in [StreamKind::Content, StreamKind::Groups] {
            let generations: Vec<u64> = messages
                .iter()
                .filter(|m| m.kind == kind)
                .map(|m| m.generation)
                .collect();
            assert!(generations.windows(2).all(|w| w[0] <= w[1]), "{:?}", generations);
        }
        assert!(rx.try_recv().is_err());
    }

    fn wait_started(rx: &Receiver<CoordinatorEvent>, kind: StreamKind) {
        loop {
            if let CoordinatorEvent::Stream(StreamMessage {
                kind: k,
                event: StreamEvent::Started { .. },
                ..
            }) = rx.recv_timeout(RECV_TIMEOUT).unwrap()
            {
                if k == kind {
                    return;
                }
            }
        }
    }

    fn wait_running(gauge: &RunningGauge, kind: StreamKind, expected: usize) {
        let deadline = std::time::Instant::now() + RECV_TIMEOUT;
        while gauge.running(kind) != expected {
            assert!(std::time::Instant::now() < deadline, "{} never reached {}", kind, expected);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_cancel_empties_only_its_slot() {
        if !program_available("jq") {
            eprintln!("skipping: jq not found on PATH");
            return;
        }
        let file = sample_file();
        let (tx, rx) = channel();
        let coordinator = Coordinator::spawn(PipelineRunner::new("jq"), tx);
        let gauge = coordinator.gauge();

        for kind in [StreamKind::Groups, StreamKind::Content] {
            coordinator.send(StreamCommand::Start {
                kind,
                generation: 1,
                params: params(&file, ".level"),
            });
        }
        wait_running(&gauge, StreamKind::Content, 1);
        wait_running(&gauge, StreamKind::Groups, 1);

        coordinator.send(StreamCommand::Cancel {
            kind: StreamKind::Content,
        });
        wait_running(&gauge, StreamKind::Content, 0);
        assert_eq!(gauge.running(StreamKind::Groups), 1);

        coordinator.send(StreamCommand::Stop);
        wait_shutdown(&rx);
        coordinator.join();
        assert_eq!(gauge.running(StreamKind::Groups), 0);
    }

    #[test]
    fn test_drop_without_stop_kills_pipelines() {
        if !program_available("jq") {
            eprintln!("skipping: jq not found on PATH");
            return;
        }
        let file = sample_file();
        let (tx, rx) = channel();
        let coordinator = Coordinator::spawn(PipelineRunner::new("jq"), tx);
        let gauge = coordinator.gauge();

        coordinator.send(StreamCommand::Start {
            kind: StreamKind::Content,
            generation: 1,
            params: params(&file, ".level"),
        });
        wait_started(&rx, StreamKind::Content);

        drop(coordinator);

        // The live tail was running; dropping joined its thread.
        assert_eq!(gauge.running(StreamKind::Content), 0);
        assert_eq!(
            rx.try_iter()
                .filter(|e| *e == CoordinatorEvent::ShutdownComplete)
                .count(),
            1
        );
    }

    #[test]
    fn test_superseded_groups_events_never_follow_new_ones() {
        if !program_available("jq") {
            eprintln!("skipping: jq not found on PATH");
            return;
        }
        let file = sample_file();
        let (tx, rx) = channel();
        let coordinator = Coordinator::spawn(PipelineRunner::new("jq"), tx);

        coordinator.send(StreamCommand::Start {
            kind: StreamKind::Groups,
            generation: 1,
            params: params(&file, ".lev"),
        });
        coordinator.send(StreamCommand::Start {
            kind: StreamKind::Groups,
            generation: 2,
            params: params(&file, ".level"),
        });

        let mut newest_seen = false;
        loop {
            match rx.recv_timeout(RECV_TIMEOUT).unwrap() {
                CoordinatorEvent::Stream(msg) => {
                    if msg.generation == 2 {
                        newest_seen = true;
                        assert_eq!(
                            msg.event,
                            StreamEvent::Started {
                                lines: vec!["error".into(), "info".into()],
                                command: format!(
                                    "jq -r '.|select(.level)|.level' '{}'",
                                    file.path().display()
                                ),
                            }
                        );
                        break;
                    }
                    assert!(!newest_seen);
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }

        coordinator.send(StreamCommand::Stop);
        let rest = wait_shutdown(&rx);
        assert!(rest.iter().all(|m| m.generation == 2));
        coordinator.join();
    }
}
