//! Module wiring the producer, the per-file fan-out/fan-in and the consumer into one run.

use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam_channel::{bounded, select};
use tracing::{debug, info, warn};

use crate::{Config, Error, domain::TransportRecord};

pub(crate) mod cancel;
mod consumer;
mod orchestration;
mod producer;

use cancel::{Breaker, Cancellation};
use consumer::{ConsumerReport, consume};
use producer::{ProducerReport, produce};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Configuration checked and output directory prepared, nothing spawned yet
    Idle,
    /// Producer and consumer are both active
    Running,
    /// The shared stream is closed and the consumer is writing the groups
    Draining,
    Complete,
    /// The run stopped on a walk error or a cancellation, no output was written
    Aborted,
}

impl PipelineState {
    /// Whether a run in this state is over.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Aborted)
    }
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Records received by the consumer, over all groups
    pub records: usize,
    pub groups: usize,
    pub files_written: usize,
    pub write_failures: usize,
    /// Log files processed
    pub files: usize,
    /// Log files which could not be read
    pub skipped_files: usize,
    /// Lines which could not be decoded
    pub dropped_lines: usize,
    pub state: PipelineState,
}

impl RunSummary {
    fn new(produced: ProducerReport, consumed: ConsumerReport) -> Self {
        Self {
            records: consumed.records,
            groups: consumed.groups,
            files_written: consumed.flush.written.len(),
            write_failures: consumed.flush.failed.len(),
            files: produced.files,
            skipped_files: produced.skipped_files,
            dropped_lines: produced.dropped_lines,
            state: consumed.state,
        }
    }
}

///
/// Runs the pipeline until completion and blocks until every task has exited.
///
/// The run owns its breaker and trips it once the consumer has signalled completion.
/// If `external` is cancelled while the producer is still active, the run trips its breaker early,
/// writes nothing and returns [`Error::Cancelled`].
///
pub(crate) fn run_pipeline(config: &Config, external: &Cancellation) -> Result<RunSummary, Error> {
    config.validate()?;
    std::fs::create_dir_all(&config.output_dir).map_err(|source| Error::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;
    if external.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let breaker = Breaker::new();
    let cancel = breaker.cancellation();

    let (stream_tx, stream_rx) = bounded::<TransportRecord>(config.channel_capacity);
    let (done_tx, done_rx) = bounded::<ConsumerReport>(1);
    let (produced_tx, produced_rx) = bounded::<Result<ProducerReport, Error>>(1);

    info!(
        state = ?PipelineState::Idle,
        workers = config.workers,
        file_tasks = config.file_tasks,
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        "pipeline starting"
    );

    thread::scope(|s| -> Result<RunSummary, Error> {
        let output_dir = config.output_dir.as_path();
        let consumer_cancel = cancel.clone();
        spawn_scoped(s, "consumer".to_string(), move || {
            consume(stream_rx, output_dir, &consumer_cancel, done_tx)
        })?;

        let producer_stream = stream_tx.clone();
        let producer_cancel = cancel.clone();
        let producer = spawn_scoped(s, "producer".to_string(), move || {
            let produced = produce(config, &producer_stream, &producer_cancel);
            drop(producer_stream);
            // the run waits on this channel until it is interrupted, so it may be gone already
            let _ = produced_tx.send(produced);
        });

        let produced = match producer {
            Ok(_) => {
                debug!(state = ?PipelineState::Running, "producer and consumer spawned");
                select! {
                    recv(produced_rx) -> produced => produced.unwrap_or(Err(Error::Cancelled)),
                    recv(external.signal()) -> _ => {
                        warn!("run cancelled while producing");
                        Err(Error::Cancelled)
                    }
                }
            }
            Err(err) => Err(err),
        };

        // An aborted run trips the breaker before the stream closes, so the consumer discards its buckets
        let breaker = match produced {
            Ok(_) => Some(breaker),
            Err(_) => {
                breaker.trip();
                None
            }
        };
        drop(stream_tx);

        let consumed = done_rx.recv();
        if let Some(breaker) = breaker {
            breaker.trip();
        }

        let consumed = consumed.map_err(|_| Error::Cancelled)?;
        let summary = RunSummary::new(produced?, consumed);
        info!(
            records = summary.records,
            groups = summary.groups,
            files_written = summary.files_written,
            dropped_lines = summary.dropped_lines,
            "pipeline complete"
        );
        Ok(summary)
    })
}

/// Spawns a named thread into `s`. A refused spawn is returned as [`Error::ThreadSpawn`].
pub(crate) fn spawn_scoped<'s, 'e, T: Send + 's>(
    s: &'s Scope<'s, 'e>,
    name: String,
    task: impl FnOnce() -> T + Send + 's,
) -> Result<ScopedJoinHandle<'s, T>, Error> {
    thread::Builder::new()
        .name(name.clone())
        .spawn_scoped(s, task)
        .map_err(|source| Error::ThreadSpawn { name, source })
}
