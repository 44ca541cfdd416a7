// src/normalize.rs
//! Timestamp parsing and expiry computation for log entries.
//!
//! Each entry is normalized on its own against a single `now` captured at
//! the start of the run. An entry whose timestamps do not parse comes back
//! as `Err` and takes no further part in the pipeline.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use tracing::error;

use crate::crtsh::CrtShEntry;
use crate::error::{TimeField, TimeParseError};

/// Layout of `not_before` / `not_after` in crt.sh rows (UTC, no zone suffix)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A log entry with parsed validity window and expiry status
#[derive(Debug, Clone, PartialEq)]
pub struct CertRecord {
    pub entry: CrtShEntry,
    pub not_before_time: DateTime<Utc>,
    pub not_after_time: DateTime<Utc>,
    /// `not_after_time - now`; negative once expired
    pub time_left: TimeDelta,
    /// Past `not_after` or not yet at `not_before`
    pub expired: bool,
    /// Live verification finding, `None` when clean or not verified
    pub actual: Option<String>,
}

pub fn parse_timestamp(field: TimeField, value: &str) -> Result<DateTime<Utc>, TimeParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| TimeParseError {
            field,
            value: value.to_string(),
            source,
        })
}

/// Compute validity times, expiry and time left for one entry.
///
/// An expired `not_after` does not end processing: `not_before` is still
/// parsed and checked and `time_left` is always filled in.
pub fn normalize_entry(entry: CrtShEntry, now: DateTime<Utc>) -> Result<CertRecord, TimeParseError> {
    let not_after_time = parse_timestamp(TimeField::NotAfter, &entry.not_after)?;
    let mut expired = now > not_after_time;

    let not_before_time = parse_timestamp(TimeField::NotBefore, &entry.not_before)?;
    if now < not_before_time {
        expired = true;
    }

    Ok(CertRecord {
        entry,
        not_before_time,
        not_after_time,
        time_left: not_after_time - now,
        expired,
        actual: None,
    })
}

pub fn normalize_all(entries: Vec<CrtShEntry>, now: DateTime<Utc>) -> Vec<Result<CertRecord, TimeParseError>> {
    entries
        .into_iter()
        .map(|entry| normalize_entry(entry, now))
        .collect()
}

/// Log every failed entry and keep the rest
pub fn keep_parsed(results: Vec<Result<CertRecord, TimeParseError>>) -> Vec<CertRecord> {
    results
        .into_iter()
        .filter_map(|result| match result {
            Ok(record) => Some(record),
            Err(e) => {
                error!(field = %e.field, value = %e.value, "Unable to parse time: {}", e.source);
                None
            }
        })
        .collect()
}
