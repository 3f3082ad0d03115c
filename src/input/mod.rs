//! Module defining the parsing logic: tagged raw lines into [`LogRecord`]s, and transport
//! records back into the group key the consumer buckets them by.

use serde::Deserialize;

use crate::domain::{GroupKey, LogRecord, TransportRecord};
use crate::error::{DecodeError, DecodeErrorKind};


pub(crate) const FIELD_SEPARATOR: char = '|';

/// Number of `|`-separated segments of a tagged line: object, id, section, category,
/// user, seed, group and timestamp.
pub const FIELD_COUNT: usize = 8;

/// Decodes a tagged line (the worker tag concatenated with the raw line) into a [`LogRecord`].
///
/// The line must split into exactly [`FIELD_COUNT`] segments and the second segment must be a
/// 64-bit integer. No segment is trimmed.
pub fn decode(tagged_line: &str) -> Result<LogRecord, DecodeError> {
    let segments: Vec<&str> = tagged_line.split(FIELD_SEPARATOR).collect();

    let [object, id, section, category, user, seed, group, timestamp] = segments.as_slice() else {
        return Err(DecodeError::new(DecodeErrorKind::MalformedField, tagged_line));
    };

    let id = id
        .parse::<i64>()
        .map_err(|_| DecodeError::new(DecodeErrorKind::InvalidId, tagged_line))?;

    Ok(LogRecord {
        object: object.to_string(),
        id,
        section: section.to_string(),
        category: category.to_string(),
        user: user.to_string(),
        seed: seed.to_string(),
        group: group.to_string(),
        timestamp: timestamp.to_string(),
    })
}

// Only the group is needed to bucket a record, the rest of the object is ignored
#[derive(Deserialize)]
struct GroupField {
    group: String,
}

/// Reads the group key out of a transport record without decoding the whole record.
pub(crate) fn extract_group(record: &TransportRecord) -> Result<GroupKey, serde_json::Error> {
    let GroupField { group } = serde_json::from_str(record.as_str())?;
    Ok(GroupKey::new(group))
}
