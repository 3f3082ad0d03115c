//! Module for the types flowing through the pipeline, from a raw line to a group bucket.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A log line decoded into its fields.
///
/// The serde field names are those of the output files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "obj")]
    pub object: String,
    pub id: i64,
    pub section: String,
    pub category: String,
    pub user: String,
    pub seed: String,
    pub group: String,
    #[serde(rename = "time_stamp")]
    pub timestamp: String,
}

/// The serialized form of a [`LogRecord`] which is passed between the pipeline stages
/// and written to the output files: a single-line JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportRecord(String);

impl TransportRecord {
    pub(crate) fn new(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TransportRecord> for String {
    fn from(value: TransportRecord) -> Self {
        value.0
    }
}

/// Key of a group bucket. The empty key is the bucket of the ungrouped records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct GroupKey(String);

impl GroupKey {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub(crate) fn ungrouped() -> Self {
        Self::default()
    }

    pub(crate) fn is_ungrouped(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity of a worker: its 1-based position in the pool and the file it works on.
/// Only used for tracing and as the prefix of the object field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkerTag(String);

impl WorkerTag {
    pub(crate) fn new(pool_index: usize, file_name: &str) -> Self {
        Self(format!("w{}_{file_name}", pool_index + 1))
    }

    /// Prefixes the raw line with the tag. The tag becomes part of the first segment,
    /// so the segment count of the line is unchanged.
    pub(crate) fn apply(&self, raw_line: &str) -> String {
        format!("{}{raw_line}", self.0)
    }
}

impl fmt::Display for WorkerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
