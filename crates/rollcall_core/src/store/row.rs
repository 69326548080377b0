//! Log row codec.
//!
//! # Responsibility
//! - Encode records as unescaped 5-field comma-separated rows.
//! - Decode rows back into records, reporting malformed lines.
//!
//! # Invariants
//! - Field order is `PeopleSignedOut,Location,TimeOut,TimeIn,Phone`.
//! - Times use `HH:MM:SS`; an empty `TimeIn` marks an active row.

use crate::model::record::{decode_name, SignOutRecord};
use chrono::NaiveTime;
use std::fmt::{Display, Formatter};

/// First line of every daily log.
pub const HEADER: &str = "PeopleSignedOut,Location,TimeOut,TimeIn,Phone";
/// Persisted time format.
pub const TIME_FORMAT: &str = "%H:%M:%S";

const FIELD_SEPARATOR: char = ',';
const FIELD_COUNT: usize = 5;
const TIME_IN_FIELD: usize = 3;

/// A row that could not be decoded and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    /// 1-based line number in the log file.
    pub line: usize,
    pub reason: String,
}

impl Display for MalformedRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed row at line {}: {}", self.line, self.reason)
    }
}

/// Borrowed view over the five fields of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRow<'a> {
    pub stored_name: &'a str,
    pub location: &'a str,
    pub time_out: &'a str,
    pub time_in: &'a str,
    pub phone: &'a str,
}

impl<'a> RawRow<'a> {
    /// Splits a line into fields; fails unless exactly five are present.
    pub fn split(line: &'a str) -> Result<Self, String> {
        let fields = line.split(FIELD_SEPARATOR).collect::<Vec<_>>();
        if fields.len() != FIELD_COUNT {
            return Err(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            ));
        }
        Ok(Self {
            stored_name: fields[0],
            location: fields[1],
            time_out: fields[2],
            time_in: fields[3],
            phone: fields[4],
        })
    }

    pub fn is_active(&self) -> bool {
        self.time_in.is_empty()
    }

    /// Decodes the row into a record with a fresh id.
    pub fn into_record(self) -> Result<SignOutRecord, String> {
        let time_out = parse_time(self.time_out)
            .ok_or_else(|| format!("invalid TimeOut `{}`", self.time_out))?;
        let time_in = if self.time_in.is_empty() {
            None
        } else {
            Some(
                parse_time(self.time_in)
                    .ok_or_else(|| format!("invalid TimeIn `{}`", self.time_in))?,
            )
        };
        let mut record = SignOutRecord::new(
            decode_name(self.stored_name),
            self.location,
            self.phone,
            time_out,
        );
        record.time_signed_in = time_in;
        Ok(record)
    }
}

/// Encodes a record as one row, without a trailing newline.
pub fn encode_row(record: &SignOutRecord) -> String {
    let time_in = record
        .time_signed_in
        .map(format_time)
        .unwrap_or_default();
    [
        record.stored_name().as_str(),
        record.location.as_str(),
        format_time(record.time_signed_out).as_str(),
        time_in.as_str(),
        record.phone.as_str(),
    ]
    .join(",")
}

/// Returns `line` with its `TimeIn` field replaced.
pub fn with_time_in(line: &str, time: NaiveTime) -> String {
    line.split(FIELD_SEPARATOR)
        .enumerate()
        .map(|(index, field)| {
            if index == TIME_IN_FIELD {
                format_time(time)
            } else {
                field.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}
