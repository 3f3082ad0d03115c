//! Module defining the errors which are exposed to the users of the crate

use std::path::PathBuf;

/// What made a line undecodable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The line does not split into exactly the expected number of `|`-separated segments
    MalformedField,
    /// The id segment is not a valid 64-bit integer
    InvalidId,
}

/// A raw line which could not be turned into a [`crate::LogRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot decode line ({kind:?}): {line:?}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub line: String,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, line: impl Into<String>) -> Self {
        Self {
            kind,
            line: line.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A log file could not be read. The file is skipped.
    #[error("cannot read log file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An output file could not be written. The output of that group is lost.
    #[error("cannot write output file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The input tree could not be enumerated. Aborts the run.
    #[error("cannot walk source directory {root}: {source}")]
    DirectoryWalk {
        root: PathBuf,
        source: walkdir::Error,
    },

    /// The output directory could not be prepared before the run started.
    #[error("cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The operating system refused to start one of the pipeline threads. Aborts the run.
    #[error("cannot spawn thread {name}: {source}")]
    ThreadSpawn {
        name: String,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was cancelled from outside before the consumer could flush its groups.
    #[error("pipeline run was cancelled")]
    Cancelled,
}

pub(crate) fn file_read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
    Error::FileRead {
        path: path.into(),
        source,
    }
}

pub(crate) fn file_write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
    Error::FileWrite {
        path: path.into(),
        source,
    }
}
