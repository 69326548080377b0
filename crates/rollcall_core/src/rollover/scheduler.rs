//! Rollover state machine.

use crate::roster::RosterState;
use crate::store::{SignOutLog, StoreResult};
use chrono::{NaiveDate, NaiveDateTime};
use log::{error, info, warn};
use std::time::Instant;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverPhase {
    /// Waiting; the roster writes to the log for this date.
    Idle(NaiveDate),
    /// Migration to a new day is in progress.
    RollingOver,
}

/// Result of one rollover check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged,
    RolledOver {
        from: NaiveDate,
        to: NaiveDate,
        carried: usize,
    },
}

/// Detects day boundaries and migrates active records.
#[derive(Debug, Clone)]
pub struct RolloverScheduler {
    phase: RolloverPhase,
    carry_over_marker: String,
}

impl RolloverScheduler {
    pub fn new(current: NaiveDate, carry_over_marker: impl Into<String>) -> Self {
        Self {
            phase: RolloverPhase::Idle(current),
            carry_over_marker: carry_over_marker.into(),
        }
    }

    pub fn phase(&self) -> RolloverPhase {
        self.phase
    }

    pub fn carry_over_marker(&self) -> &str {
        &self.carry_over_marker
    }

    /// Compares `now` with the current day and rolls over when they differ.
    ///
    /// With no active records the new day's log is still created, empty.
    ///
    /// # Errors
    /// - Storage errors from opening or writing the new log. The scheduler
    ///   stays on the old date so the next tick retries.
    pub fn tick<L: SignOutLog>(
        &mut self,
        now: NaiveDateTime,
        roster: &mut RosterState<L>,
    ) -> StoreResult<TickOutcome> {
        let RolloverPhase::Idle(current) = self.phase else {
            return Ok(TickOutcome::Unchanged);
        };
        let today = now.date();
        if today == current {
            return Ok(TickOutcome::Unchanged);
        }
        if today < current {
            warn!("event=rollover module=rollover status=start from={current} to={today} reason=clock_moved_backwards");
        }

        let started_at = Instant::now();
        self.phase = RolloverPhase::RollingOver;
        info!(
            "event=rollover module=rollover status=start from={} to={} active={}",
            current,
            today,
            roster.len()
        );

        let result = roster
            .log()
            .open_sibling(today)
            .and_then(|next| roster.carry_over(next, now.time(), &self.carry_over_marker));

        match result {
            Ok(carried) => {
                self.phase = RolloverPhase::Idle(today);
                info!(
                    "event=rollover module=rollover status=ok from={} to={} carried={} duration_ms={}",
                    current,
                    today,
                    carried,
                    started_at.elapsed().as_millis()
                );
                Ok(TickOutcome::RolledOver {
                    from: current,
                    to: today,
                    carried,
                })
            }
            Err(err) => {
                self.phase = RolloverPhase::Idle(current);
                error!(
                    "event=rollover module=rollover status=error from={} to={} duration_ms={} error_code=storage_unavailable error={}",
                    current,
                    today,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}
