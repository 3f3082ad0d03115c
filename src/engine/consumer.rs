//! Module for the consumer: the only owner of the group buckets.

use std::collections::HashMap;
use std::path::Path;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::{
    domain::{GroupKey, TransportRecord},
    engine::{PipelineState, cancel::Cancellation},
    input::extract_group,
    output::{FlushReport, flush_groups},
};

/// Records grouped by their group key, in arrival order within each group.
#[derive(Debug, Default)]
pub(crate) struct GroupBuckets {
    buckets: HashMap<GroupKey, Vec<TransportRecord>>,
    records: usize,
}

impl GroupBuckets {
    /// Appends `record` to the bucket of its group.
    /// A record whose group cannot be read is kept in the ungrouped bucket.
    pub(crate) fn insert(&mut self, record: TransportRecord) {
        let key = extract_group(&record).unwrap_or_else(|err| {
            warn!(record = %record, "cannot read group of record, keeping it ungrouped: {err}");
            GroupKey::ungrouped()
        });
        self.buckets.entry(key).or_default().push(record);
        self.records += 1;
    }

    pub(crate) fn records(&self) -> usize {
        self.records
    }

    pub(crate) fn groups(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn into_groups(self) -> impl Iterator<Item = (GroupKey, Vec<TransportRecord>)> {
        self.buckets.into_iter()
    }
}

/// What the consumer reports over the completion signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConsumerReport {
    pub(crate) records: usize,
    pub(crate) groups: usize,
    pub(crate) flush: FlushReport,
    pub(crate) state: PipelineState,
}

///
/// Drains `stream` into group buckets until the producer side closes it, then writes one file per
/// group into `output_dir` and raises the completion signal by sending its report over `done`.
///
/// If the breaker has tripped by the time the stream ends, nothing is written and the report
/// carries [`PipelineState::Aborted`].
///
pub(crate) fn consume(
    stream: Receiver<TransportRecord>,
    output_dir: &Path,
    cancel: &Cancellation,
    done: Sender<ConsumerReport>,
) {
    let mut buckets = GroupBuckets::default();

    while let Some(record) = cancel.recv(&stream) {
        buckets.insert(record);
    }

    let records = buckets.records();
    let groups = buckets.groups();
    info!(records, groups, "shared stream closed");

    let report = if cancel.is_cancelled() {
        warn!(records, "run aborted, discarding buffered records");
        ConsumerReport {
            records,
            groups,
            flush: FlushReport::default(),
            state: PipelineState::Aborted,
        }
    } else {
        debug!(state = ?PipelineState::Draining, "flushing groups");
        let flush = flush_groups(output_dir, buckets.into_groups());
        ConsumerReport {
            records,
            groups,
            flush,
            state: PipelineState::Complete,
        }
    };

    // The receiving side only goes away if the run itself panicked
    let _ = done.send(report);
}
