mod config;
mod domain;
mod engine;
mod error;
mod input;
mod output;
mod telemetry;

pub use config::{Config, DEFAULT_EXTENSION, DEFAULT_WORKERS, default_file_tasks};
pub use domain::{LogRecord, TransportRecord};
pub use engine::cancel::{Breaker, Cancellation};
pub use engine::{PipelineState, RunSummary};
pub use error::{DecodeError, DecodeErrorKind, Error};
pub use input::{FIELD_COUNT, decode};
pub use output::encode;
pub use telemetry::setup_logging;

/// Groups the records of every log file under `config.input_dir` into one output file per group.
///
/// This is the main entry point of the crate. The files are shared out between
/// `config.file_tasks` file tasks. A file task fans the non-blank lines of its current file out
/// to `config.workers` parsing workers and merges their results into one shared stream. A single consumer buckets the records of that stream by their `group` field and,
/// once every file task is done, writes each bucket to `config.output_dir` as
/// `group_<group>_output.log` (or `ungrouped_output.log` for the empty group), one JSON object per line.
///
/// The call blocks until the output is written and every task has exited.
///
/// # Error handling
///
/// Not every input is expected to be clean. Undecodable lines, unreadable log files and output
/// files which cannot be written are logged with `tracing` and counted in the returned
/// [`RunSummary`]; the run carries on without them.
/// Only a failure to walk the input tree, to prepare the output directory or to spawn a pipeline
/// thread aborts the run, in which case no output is written.
///
/// # Example
///
/// ```no_run
/// use log_grouper::{Config, run};
///
/// let config = Config::new("data/input", "data/output").with_workers(4);
/// let summary = run(&config).unwrap();
/// println!("{} records in {} groups", summary.records, summary.groups);
/// ```
pub fn run(config: &Config) -> Result<RunSummary, Error> {
    engine::run_pipeline(config, &Cancellation::never())
}

/// Same as [`run`], but gives up as soon as `cancel` is tripped while the log files are still
/// being processed. A cancelled run writes no output and returns [`Error::Cancelled`] once every
/// task has exited.
///
/// ```no_run
/// use log_grouper::{Breaker, Config, run_until};
///
/// let breaker = Breaker::new();
/// let cancel = breaker.cancellation();
/// let worker = std::thread::spawn(move || run_until(&Config::new("in", "out"), &cancel));
/// breaker.trip();
/// let _ = worker.join().unwrap();
/// ```
pub fn run_until(config: &Config, cancel: &Cancellation) -> Result<RunSummary, Error> {
    engine::run_pipeline(config, cancel)
}
