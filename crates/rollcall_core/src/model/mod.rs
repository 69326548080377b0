//! Roster domain model.
//!
//! # Responsibility
//! - Define the sign-out record shared by roster, store and rollover code.
//! - Own the display/storage encodings of multi-person names.
//!
//! # Invariants
//! - A live record is identified by a process-local `RecordId`.
//! - A record with `time_signed_in` set is no longer active.

pub mod record;
