//! Calendar-day rollover.
//!
//! # Responsibility
//! - Detect that the local date moved past the roster's current log day.
//! - Carry still-active records into the new day's log.
//! - Drive the check periodically with an explicit start/stop lifecycle.
//!
//! # Invariants
//! - A rollover either completes (new log written, roster redirected) or
//!   leaves the previous day's log and records in place for the next tick.
//! - The previous day's file is never written during carry-over.

pub mod scheduler;
pub mod timer;

pub use scheduler::{RolloverPhase, RolloverScheduler, TickOutcome};
pub use timer::RolloverTimer;

/// Default period between rollover checks.
pub const DEFAULT_ROLLOVER_INTERVAL_SECS: u64 = 60;
/// Default annotation appended to a carried-over record's location.
pub const DEFAULT_CARRY_OVER_MARKER: &str = " (carried over)";
