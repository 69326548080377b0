//! Live roster of people currently signed out.
//!
//! # Responsibility
//! - Hold the ordered set of active records and the current selection.
//! - Mirror every mutation into the current day's log.
//!
//! # Invariants
//! - Every record in the roster has `time_signed_in == None`.
//! - Disk is written before memory changes; a failed write leaves memory
//!   untouched.
//! - Insertion order is sign-out order.

use crate::model::record::{RecordId, RecordValidationError};
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod state;

pub use state::{RosterState, SignInOutcome};

pub type RosterResult<T> = Result<T, RosterError>;

/// Error for roster mutations.
#[derive(Debug)]
pub enum RosterError {
    Validation(RecordValidationError),
    Storage(StoreError),
    /// The record handed to `sign_out` already carries a sign-in time.
    AlreadySignedIn(RecordId),
}

impl Display for RosterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::AlreadySignedIn(id) => write!(f, "record already signed in: {id}"),
        }
    }
}

impl Error for RosterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::AlreadySignedIn(_) => None,
        }
    }
}

impl From<RecordValidationError> for RosterError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RosterError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::InvalidRecord(err) => Self::Validation(err),
            other => Self::Storage(other),
        }
    }
}
