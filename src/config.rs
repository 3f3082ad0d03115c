//! Module for the resolved configuration of a pipeline run

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

use crate::Error;

pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_EXTENSION: &str = "log";

// used when the available parallelism cannot be queried
const FALLBACK_FILE_TASKS: usize = 4;

/// Number of files processed at the same time when not configured: one per available core.
pub fn default_file_tasks() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_FILE_TASKS)
}

/// Everything a run needs to know. Build it with [`Config::new`] and the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the tree which is searched for log files
    pub input_dir: PathBuf,
    /// Directory receiving one file per group
    pub output_dir: PathBuf,
    /// Number of parsing workers per file
    pub workers: usize,
    /// Number of files processed at the same time. Every active file holds `workers + 2` threads.
    pub file_tasks: usize,
    /// Extension (without the dot) of the files treated as input
    pub extension: String,
    /// Capacity of every channel of the pipeline. `0` makes them rendezvous channels.
    pub channel_capacity: usize,
}

impl Config {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            workers: DEFAULT_WORKERS,
            file_tasks: default_file_tasks(),
            extension: DEFAULT_EXTENSION.to_string(),
            channel_capacity: 0,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_file_tasks(mut self, file_tasks: usize) -> Self {
        self.file_tasks = file_tasks;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig(
                "the number of workers must be positive".to_string(),
            ));
        }
        if self.file_tasks == 0 {
            return Err(Error::InvalidConfig(
                "the number of file tasks must be positive".to_string(),
            ));
        }
        if self.extension.is_empty() {
            return Err(Error::InvalidConfig(
                "the input file extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `path` names a file the producer should pick up: everything after the last `.` of
    /// the file name must equal the extension. A bare `.log` qualifies.
    pub(crate) fn is_input_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy())
            .is_some_and(|name| {
                name.rsplit_once('.')
                    .is_some_and(|(_, ext)| ext == self.extension)
            })
    }
}
