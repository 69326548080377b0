//! Sign-out record model.
//!
//! # Responsibility
//! - Define the single domain entity tracked by the roster.
//! - Encode/decode multi-person names between display and storage form.
//! - Reject field values the unescaped row format cannot represent.
//!
//! # Invariants
//! - `time_signed_out` is captured once, at creation, with second precision.
//! - `time_signed_in == None` means the record is active.
//! - `id` is never persisted; reloaded records receive fresh ids.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Separator between people in the display form of a name.
pub const DISPLAY_NAME_SEPARATOR: &str = ", ";
/// Separator between people in the persisted form of a name.
pub const STORED_NAME_SEPARATOR: char = '%';

/// Process-local identity of one live record.
///
/// Two sign-outs with identical fields still receive distinct ids, which is
/// what lets the roster remove one without touching the other.
pub type RecordId = Uuid;

/// Validation error for record fields that the log row cannot carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Name is empty after trimming.
    EmptyName,
    /// Name contains the storage separator `%`.
    NameContainsStoredSeparator,
    /// Name still contains a comma after `, ` → `%` encoding.
    NameContainsBareComma,
    /// Field contains the row field separator.
    FieldContainsComma(&'static str),
    /// Field contains a line break.
    FieldContainsLineBreak(&'static str),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name cannot be empty"),
            Self::NameContainsStoredSeparator => {
                write!(f, "name cannot contain `{STORED_NAME_SEPARATOR}`")
            }
            Self::NameContainsBareComma => write!(
                f,
                "names must be separated by `{DISPLAY_NAME_SEPARATOR}`; found a bare comma"
            ),
            Self::FieldContainsComma(field) => write!(f, "{field} cannot contain `,`"),
            Self::FieldContainsLineBreak(field) => write!(f, "{field} cannot contain line breaks"),
        }
    }
}

impl Error for RecordValidationError {}

/// One person or group signed out of the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOutRecord {
    pub id: RecordId,
    /// Display form; several people are joined with `, `.
    pub name: String,
    pub location: String,
    pub phone: String,
    pub time_signed_out: NaiveTime,
    pub time_signed_in: Option<NaiveTime>,
}

impl SignOutRecord {
    /// Creates an active record signed out at `time_signed_out`.
    ///
    /// Sub-second precision is dropped so the in-memory value equals the
    /// value read back from the log.
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        phone: impl Into<String>,
        time_signed_out: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location: location.into(),
            phone: phone.into(),
            time_signed_out: truncate_to_seconds(time_signed_out),
            time_signed_in: None,
        }
    }

    /// Creates a record from a group of people.
    pub fn for_group<I, S>(
        names: I,
        location: impl Into<String>,
        phone: impl Into<String>,
        time_signed_out: NaiveTime,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(DISPLAY_NAME_SEPARATOR);
        Self::new(joined, location, phone, time_signed_out)
    }

    /// Returns whether the record is still signed out.
    pub fn is_active(&self) -> bool {
        self.time_signed_in.is_none()
    }

    /// Returns the `, `-joined name shown to users.
    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// Returns the individual people covered by this record.
    pub fn names(&self) -> Vec<&str> {
        self.name.split(DISPLAY_NAME_SEPARATOR).collect()
    }

    /// Returns the name in its persisted `%`-joined form.
    pub fn stored_name(&self) -> String {
        encode_name(&self.name)
    }

    /// Checks that every field survives the unescaped row format.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.name.trim().is_empty() {
            return Err(RecordValidationError::EmptyName);
        }
        if self.name.contains(STORED_NAME_SEPARATOR) {
            return Err(RecordValidationError::NameContainsStoredSeparator);
        }
        if encode_name(&self.name).contains(',') {
            return Err(RecordValidationError::NameContainsBareComma);
        }
        for (field, value) in [
            ("name", self.name.as_str()),
            ("location", self.location.as_str()),
            ("phone", self.phone.as_str()),
        ] {
            if value.contains(['\n', '\r']) {
                return Err(RecordValidationError::FieldContainsLineBreak(field));
            }
        }
        if self.location.contains(',') {
            return Err(RecordValidationError::FieldContainsComma("location"));
        }
        if self.phone.contains(',') {
            return Err(RecordValidationError::FieldContainsComma("phone"));
        }
        Ok(())
    }
}

impl Display for SignOutRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}

/// Converts a display name into its persisted form.
pub fn encode_name(display: &str) -> String {
    display.replace(DISPLAY_NAME_SEPARATOR, &STORED_NAME_SEPARATOR.to_string())
}

/// Converts a persisted name back into its display form.
pub fn decode_name(stored: &str) -> String {
    stored.replace(STORED_NAME_SEPARATOR, DISPLAY_NAME_SEPARATOR)
}

pub(crate) fn truncate_to_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}
