//! Core roster logic for Rollcall.
//! This crate is the single source of truth for who is signed out and for
//! the per-day sign-out logs on disk.

pub mod clock;
pub mod config;
pub mod logging;
pub mod model;
pub mod rollover;
pub mod roster;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, RosterConfig};
pub use logging::{
    default_log_level, flush_logging, init_logging, init_logging_from_config, logging_status,
    LogLevel,
};
pub use model::record::{RecordId, RecordValidationError, SignOutRecord};
pub use rollover::{RolloverPhase, RolloverScheduler, RolloverTimer, TickOutcome};
pub use roster::{RosterError, RosterResult, RosterState, SignInOutcome};
pub use service::roster_service::RosterService;
pub use store::{
    ActiveLoad, DailyLogStore, MalformedRow, SignInUpdate, SignOutLog, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
