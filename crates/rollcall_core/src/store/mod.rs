//! Daily log persistence.
//!
//! # Responsibility
//! - Define the persistence contract the roster writes through.
//! - Keep row encoding and file handling inside the storage boundary.
//!
//! # Invariants
//! - Write paths validate records before touching the filesystem.
//! - Storage failures surface as `StoreError::StorageUnavailable`; a missing
//!   row on sign-in is an outcome value, not an error.
//! - Reads skip malformed rows instead of aborting.

use crate::model::record::{RecordValidationError, SignOutRecord};
use chrono::{NaiveDate, NaiveTime};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub mod daily_log;
pub mod matcher;
pub mod row;

pub use daily_log::{ActiveLoad, DailyLogStore};
pub use row::MalformedRow;

pub type StoreResult<T> = Result<T, StoreError>;

/// Filesystem step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    CreateDir,
    Create,
    Open,
    Read,
    Write,
    Sync,
    Replace,
}

impl Display for StoreAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::CreateDir => "create directory",
            Self::Create => "create",
            Self::Open => "open",
            Self::Read => "read",
            Self::Write => "write",
            Self::Sync => "sync",
            Self::Replace => "replace",
        };
        f.write_str(label)
    }
}

/// Error for daily log persistence operations.
#[derive(Debug)]
pub enum StoreError {
    /// The log file or its directory cannot be created, opened, or written.
    StorageUnavailable {
        path: PathBuf,
        action: StoreAction,
        source: io::Error,
    },
    /// The record cannot be represented as a log row.
    InvalidRecord(RecordValidationError),
}

impl StoreError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, action: StoreAction, source: io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            action,
            source,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable {
                path,
                action,
                source,
            } => write!(
                f,
                "storage unavailable: failed to {action} `{}`: {source}",
                path.display()
            ),
            Self::InvalidRecord(err) => write!(f, "invalid record: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable { source, .. } => Some(source),
            Self::InvalidRecord(err) => Some(err),
        }
    }
}

impl From<RecordValidationError> for StoreError {
    fn from(value: RecordValidationError) -> Self {
        Self::InvalidRecord(value)
    }
}

/// Result of persisting a sign-in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInUpdate {
    /// The row at 1-based `line` now carries the sign-in time.
    Updated { line: usize },
    /// No active row matched the record's name and phone.
    NoMatchingRow,
}

/// Persistence contract for one day's sign-out log.
pub trait SignOutLog {
    /// Calendar day this log belongs to.
    fn date(&self) -> NaiveDate;

    /// Appends one active row, durable before return.
    fn append(&mut self, record: &SignOutRecord) -> StoreResult<()>;

    /// Appends several active rows with a single durable write.
    fn append_all(&mut self, records: &[SignOutRecord]) -> StoreResult<()>;

    /// Fills in the sign-in time of the first active row matching `record`.
    fn update_sign_in(&mut self, record: &SignOutRecord, time: NaiveTime)
        -> StoreResult<SignInUpdate>;

    /// Opens the log for another day at the same location.
    fn open_sibling(&self, date: NaiveDate) -> StoreResult<Self>
    where
        Self: Sized;
}
