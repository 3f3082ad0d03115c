//! Module focusing on the way the lines of one file are fanned out to a pool of worker
//! threads and how their results are fanned back into the shared stream.

use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam_channel::{Receiver, Select, Sender, bounded};
use tracing::{debug, warn};

use crate::{
    Error,
    domain::{TransportRecord, WorkerTag},
    engine::{cancel::Cancellation, spawn_scoped},
    input::decode,
    output::encode,
};

/// What happened to the lines of one file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileOutcome {
    /// Non-blank lines handed to the workers
    pub(crate) dispatched: usize,
    /// Lines the workers could not decode
    pub(crate) dropped: usize,
    /// Records forwarded into the shared stream
    pub(crate) forwarded: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct WorkerOutcome {
    encoded: usize,
    dropped: usize,
}

///
/// Runs the fan-out/fan-in for the content of one file: the lines are dispatched to `num_workers`
/// workers pulling from one distribution channel, and the workers' outputs are merged into `stream`.
/// Returns once the dispatcher, every worker and the merger are done.
///
/// If one of the threads cannot be spawned, nothing of the file is dispatched and the error is
/// returned after the threads already running have exited.
///
pub(crate) fn process_content(
    content: &str,
    file_name: &str,
    num_workers: usize,
    channel_capacity: usize,
    stream: &Sender<TransportRecord>,
    cancel: &Cancellation,
) -> Result<FileOutcome, Error> {
    thread::scope(|s| -> Result<FileOutcome, Error> {
        let (line_tx, line_rx) = bounded::<String>(channel_capacity);

        // Workers start first: on a failed spawn `line_tx` is dropped unused and they run dry
        let (outputs, workers) =
            spawn_workers(s, file_name, num_workers, line_rx, channel_capacity, cancel)?;

        let dispatcher = {
            let cancel = cancel.clone();
            spawn_scoped(s, format!("dispatch_{file_name}"), move || {
                dispatch(content, line_tx, &cancel)
            })?
        };

        let forwarded = merge(outputs, stream, cancel);

        let dispatched = dispatcher.join().expect("dispatcher thread does not panic");
        let dropped = workers
            .into_iter()
            .map(|handle| handle.join().expect("worker thread does not panic"))
            .map(|outcome| outcome.dropped)
            .sum();

        Ok(FileOutcome {
            dispatched,
            dropped,
            forwarded,
        })
    })
}

/// Pushes the non-blank lines of `content` into the distribution channel, one at a time.
/// Dropping `lines` at the end closes the channel, which lets the workers run dry.
fn dispatch(content: &str, lines: Sender<String>, cancel: &Cancellation) -> usize {
    let mut dispatched = 0;
    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        if !cancel.send(&lines, line.to_owned()) {
            debug!(dispatched, "dispatcher stopped early");
            break;
        }
        dispatched += 1;
    }
    dispatched
}

/// Output channels of the workers, in pool order, and their handles.
type SpawnedWorkers<'s> = (
    Vec<Receiver<TransportRecord>>,
    Vec<ScopedJoinHandle<'s, WorkerOutcome>>,
);

fn spawn_workers<'s, 'e>(
    s: &'s Scope<'s, 'e>,
    file_name: &str,
    num_workers: usize,
    lines: Receiver<String>,
    channel_capacity: usize,
    cancel: &Cancellation,
) -> Result<SpawnedWorkers<'s>, Error> {
    let mut outputs = Vec::with_capacity(num_workers);
    let mut handles = Vec::with_capacity(num_workers);

    for pool_index in 0..num_workers {
        let (out_tx, out_rx) = bounded::<TransportRecord>(channel_capacity);
        let tag = WorkerTag::new(pool_index, file_name);
        let lines = lines.clone();
        let cancel = cancel.clone();

        let handle = spawn_scoped(s, tag.to_string(), move || {
            run_worker(tag, lines, out_tx, cancel)
        })?;
        handles.push(handle);
        outputs.push(out_rx);
    }

    Ok((outputs, handles))
}

/// Decodes and encodes lines until the distribution channel runs dry or the breaker trips.
/// Undecodable lines are logged and dropped. The output channel closes when the worker returns.
fn run_worker(
    tag: WorkerTag,
    lines: Receiver<String>,
    output: Sender<TransportRecord>,
    cancel: Cancellation,
) -> WorkerOutcome {
    let mut outcome = WorkerOutcome::default();

    while let Some(line) = cancel.recv(&lines) {
        let record = match decode(&tag.apply(&line)) {
            Ok(record) => record,
            Err(err) => {
                warn!(worker = %tag, "dropping line: {err}");
                outcome.dropped += 1;
                continue;
            }
        };

        if !cancel.send(&output, encode(&record)) {
            break;
        }
        outcome.encoded += 1;
    }

    debug!(
        worker = %tag,
        encoded = outcome.encoded,
        dropped = outcome.dropped,
        cancelled = cancel.is_cancelled(),
        "worker finished"
    );
    outcome
}

enum MergeEvent {
    Cancelled,
    Received(TransportRecord),
    Closed(usize),
}

/// Forwards the records of all `sources` into `stream`, taking whichever source is ready first.
/// Returns when every source is closed and drained. A tripped breaker stops the forwarding at once,
/// so records in flight at that moment are dropped.
fn merge(
    mut sources: Vec<Receiver<TransportRecord>>,
    stream: &Sender<TransportRecord>,
    cancel: &Cancellation,
) -> usize {
    let mut forwarded = 0;

    while !sources.is_empty() {
        if cancel.is_cancelled() {
            break;
        }

        let event = {
            let mut select = Select::new();
            let cancel_index = select.recv(cancel.signal());
            for source in &sources {
                select.recv(source);
            }

            let op = select.select();
            let index = op.index();
            if index == cancel_index {
                let _ = op.recv(cancel.signal());
                MergeEvent::Cancelled
            } else {
                // the cancel signal was registered first, so sources start at 1
                let source_index = index - 1;
                match op.recv(&sources[source_index]) {
                    Ok(record) => MergeEvent::Received(record),
                    Err(_) => MergeEvent::Closed(source_index),
                }
            }
        };

        match event {
            MergeEvent::Cancelled => break,
            MergeEvent::Received(record) => {
                if !cancel.send(stream, record) {
                    break;
                }
                forwarded += 1;
            }
            MergeEvent::Closed(source_index) => {
                sources.swap_remove(source_index);
            }
        }
    }

    debug!(forwarded, open_sources = sources.len(), "merger finished");
    forwarded
}
