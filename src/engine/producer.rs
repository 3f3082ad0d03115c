//! Module for the producer: it walks the input tree and hands the log files to a fixed pool of
//! file tasks, all of them feeding the shared stream.

use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::{
    Config, Error,
    domain::TransportRecord,
    engine::{
        cancel::Cancellation,
        orchestration::{FileOutcome, process_content},
        spawn_scoped,
    },
    error::file_read_error,
};

/// Totals over every file task of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProducerReport {
    pub(crate) files: usize,
    pub(crate) skipped_files: usize,
    pub(crate) dispatched_lines: usize,
    pub(crate) dropped_lines: usize,
    pub(crate) forwarded_records: usize,
}

impl ProducerReport {
    fn add_file(&mut self, outcome: FileOutcome) {
        self.files += 1;
        self.dispatched_lines += outcome.dispatched;
        self.dropped_lines += outcome.dropped;
        self.forwarded_records += outcome.forwarded;
    }

    fn merge(&mut self, other: ProducerReport) {
        self.files += other.files;
        self.skipped_files += other.skipped_files;
        self.dispatched_lines += other.dispatched_lines;
        self.dropped_lines += other.dropped_lines;
        self.forwarded_records += other.forwarded_records;
    }
}

enum FileTask {
    Processed(FileOutcome),
    Skipped,
}

///
/// Walks `config.input_dir` and shares the input files out between `config.file_tasks` file
/// tasks. Returns once every file task has finished; the caller closes the shared stream afterwards.
///
/// A walk error stops the walk and is returned after the running file tasks are done, and so is a
/// thread which cannot be spawned. An unreadable file is only logged and skipped.
///
pub(crate) fn produce(
    config: &Config,
    stream: &Sender<TransportRecord>,
    cancel: &Cancellation,
) -> Result<ProducerReport, Error> {
    let (path_tx, path_rx) = bounded::<PathBuf>(config.file_tasks);

    let (report, result) = thread::scope(|s| {
        let mut tasks = Vec::with_capacity(config.file_tasks);
        let mut spawned = Ok(());
        for index in 0..config.file_tasks {
            let paths = path_rx.clone();
            match spawn_scoped(s, format!("file-task-{}", index + 1), move || {
                run_file_task(paths, config, stream, cancel)
            }) {
                Ok(task) => tasks.push(task),
                Err(err) => {
                    spawned = Err(err);
                    break;
                }
            }
        }
        drop(path_rx);

        let mut result = match spawned {
            Ok(()) => walk(config, path_tx, cancel),
            Err(err) => {
                drop(path_tx);
                Err(err)
            }
        };

        debug!(tasks = tasks.len(), "walk finished, waiting for file tasks");
        let mut report = ProducerReport::default();
        for task in tasks {
            match task.join().expect("file task does not panic") {
                Ok(task_report) => report.merge(task_report),
                Err(err) if result.is_ok() => result = Err(err),
                Err(err) => debug!("{err}"),
            }
        }

        (report, result)
    });

    if let Err(err) = result {
        error!("{err}");
        return Err(err);
    }

    info!(
        files = report.files,
        skipped = report.skipped_files,
        lines = report.dispatched_lines,
        records = report.forwarded_records,
        "all file tasks finished"
    );
    Ok(report)
}

/// Sends every input file below `config.input_dir` to the file tasks. Dropping `paths` at the end
/// lets the file tasks run dry.
fn walk(config: &Config, paths: Sender<PathBuf>, cancel: &Cancellation) -> Result<(), Error> {
    for entry in WalkDir::new(&config.input_dir) {
        let entry = entry.map_err(|source| Error::DirectoryWalk {
            root: config.input_dir.clone(),
            source,
        })?;

        // symlinks are not followed by the walk but still read as files
        if entry.file_type().is_dir() || !config.is_input_file(entry.path()) {
            continue;
        }
        if !cancel.send(&paths, entry.into_path()) {
            debug!("walk stopped early");
            break;
        }
    }
    Ok(())
}

/// Processes files one after the other until the walk is over or the breaker trips.
fn run_file_task(
    paths: Receiver<PathBuf>,
    config: &Config,
    stream: &Sender<TransportRecord>,
    cancel: &Cancellation,
) -> Result<ProducerReport, Error> {
    let mut report = ProducerReport::default();
    while let Some(path) = cancel.recv(&paths) {
        match process_file(&path, config, stream, cancel)? {
            FileTask::Processed(outcome) => report.add_file(outcome),
            FileTask::Skipped => report.skipped_files += 1,
        }
    }
    Ok(report)
}

fn process_file(
    path: &Path,
    config: &Config,
    stream: &Sender<TransportRecord>,
    cancel: &Cancellation,
) -> Result<FileTask, Error> {
    let name = display_name(path);
    debug!(path = %path.display(), "reading file");

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) => {
            warn!("{}", file_read_error(path, source));
            return Ok(FileTask::Skipped);
        }
    };

    let outcome = process_content(
        &content,
        &name,
        config.workers,
        config.channel_capacity,
        stream,
        cancel,
    )?;
    debug!(file = %name, ?outcome, "file finished");
    Ok(FileTask::Processed(outcome))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
