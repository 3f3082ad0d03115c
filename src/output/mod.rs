//! Module for everything leaving the pipeline: the transport encoding of records and the
//! per-group output files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::{GroupKey, LogRecord, TransportRecord};
use crate::error::{Error, file_write_error};


const OUTPUT_FILE_SUFFIX: &str = "output.log";

/// Serializes a record into its transport form.
pub fn encode(record: &LogRecord) -> TransportRecord {
    // A record of plain strings and an integer has no way to fail JSON serialization
    let encoded = serde_json::to_string(record).expect("log records always serialize");
    TransportRecord::new(encoded)
}

/// File name of the output of a group: `ungrouped_output.log` for the empty key,
/// `group_<key>_output.log` otherwise.
pub(crate) fn output_file_name(key: &GroupKey) -> String {
    if key.is_ungrouped() {
        format!("ungrouped_{OUTPUT_FILE_SUFFIX}")
    } else {
        format!("group_{}_{OUTPUT_FILE_SUFFIX}", key.as_str())
    }
}

/// Outcome of flushing all group buckets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct FlushReport {
    pub(crate) written: Vec<PathBuf>,
    pub(crate) failed: Vec<PathBuf>,
}

/// Writes every group to its own file in `output_dir`, one group after the other.
/// A group which cannot be written is logged and does not prevent the others from being written.
pub(crate) fn flush_groups(
    output_dir: &Path,
    groups: impl IntoIterator<Item = (GroupKey, Vec<TransportRecord>)>,
) -> FlushReport {
    let mut report = FlushReport::default();

    for (key, records) in groups {
        let path = output_dir.join(output_file_name(&key));
        match write_group(&path, &records) {
            Ok(()) => {
                info!(path = %path.display(), lines = records.len(), "group written");
                report.written.push(path);
            }
            Err(err) => {
                warn!("{err}");
                report.failed.push(path);
            }
        }
    }

    report
}

/// Creates (or truncates) `path` and writes one record per line.
fn write_group(path: &Path, records: &[TransportRecord]) -> Result<(), Error> {
    let file = File::create(path).map_err(|e| file_write_error(path, e))?;
    let mut writer = BufWriter::new(file);

    for record in records {
        writeln!(writer, "{record}").map_err(|e| file_write_error(path, e))?;
    }

    writer.flush().map_err(|e| file_write_error(path, e))
}
