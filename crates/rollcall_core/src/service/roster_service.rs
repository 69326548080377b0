//! Roster use-case service.
//!
//! # Responsibility
//! - Serialize sign-out, sign-in and rollover through one lock.
//! - Resume the current day's active records on open.
//! - Start and stop the periodic rollover timer.
//!
//! # Invariants
//! - Every mutating call checks for a pending rollover under the same lock
//!   before touching the roster, so a write lands in exactly one day's log.
//! - Callers only ever receive copies of live records.

use crate::clock::Clock;
use crate::config::RosterConfig;
use crate::model::record::{RecordId, SignOutRecord};
use crate::rollover::{RolloverScheduler, RolloverTimer, TickOutcome};
use crate::roster::{RosterResult, RosterState, SignInOutcome};
use crate::store::{DailyLogStore, MalformedRow, SignOutLog};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{error, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct Inner<L: SignOutLog> {
    roster: RosterState<L>,
    scheduler: RolloverScheduler,
}

/// Thread-safe facade over roster state and rollover.
pub struct RosterService<L: SignOutLog, C: Clock> {
    inner: Mutex<Inner<L>>,
    clock: C,
    malformed_on_open: Vec<MalformedRow>,
}

impl<C: Clock> RosterService<DailyLogStore, C> {
    /// Opens today's log under `config.log_dir` and resumes its active rows.
    ///
    /// # Errors
    /// - `Storage` when the log cannot be created or read.
    pub fn open(config: &RosterConfig, clock: C) -> RosterResult<Self> {
        let today = clock.now().date();
        let store = DailyLogStore::open(&config.log_dir, &config.file_prefix, today)?;
        let load = store.load_active()?;
        let roster = RosterState::resume(store, load.records);

        let mut service = Self::with_roster(roster, clock, config.carry_over_marker.clone());
        service.malformed_on_open = load.malformed;
        Ok(service)
    }
}

impl<L: SignOutLog, C: Clock> RosterService<L, C> {
    /// Wraps an existing roster; its log date becomes the current day.
    pub fn with_roster(
        roster: RosterState<L>,
        clock: C,
        carry_over_marker: impl Into<String>,
    ) -> Self {
        let scheduler = RolloverScheduler::new(roster.log_date(), carry_over_marker);
        Self {
            inner: Mutex::new(Inner { roster, scheduler }),
            clock,
            malformed_on_open: Vec::new(),
        }
    }

    /// Rows skipped while resuming from disk.
    pub fn malformed_on_open(&self) -> &[MalformedRow] {
        &self.malformed_on_open
    }

    /// Signs out a new record stamped with the current time.
    pub fn sign_out(
        &self,
        name: impl Into<String>,
        location: impl Into<String>,
        phone: impl Into<String>,
    ) -> RosterResult<SignOutRecord> {
        let now = self.clock.now();
        let record = SignOutRecord::new(name, location, phone, now.time());
        let mut inner = self.lock();
        roll_if_due(&mut inner, now)?;
        inner.roster.sign_out(record.clone())?;
        Ok(record)
    }

    /// Signs out a caller-built record whose `time_signed_out` is already set.
    pub fn sign_out_record(&self, record: SignOutRecord) -> RosterResult<RecordId> {
        let now = self.clock.now();
        let mut inner = self.lock();
        roll_if_due(&mut inner, now)?;
        inner.roster.sign_out(record)
    }

    /// Signs `record` in at the current time.
    pub fn sign_in(&self, record: &SignOutRecord) -> RosterResult<SignInOutcome> {
        let now = self.clock.now();
        self.sign_in_at_instant(record.id, now, now.time())
    }

    /// Signs `record` in at a caller-supplied time.
    pub fn sign_in_at(&self, record: &SignOutRecord, time: NaiveTime) -> RosterResult<SignInOutcome> {
        let now = self.clock.now();
        self.sign_in_at_instant(record.id, now, time)
    }

    /// Signs in the currently selected record, if any.
    pub fn sign_in_selected(&self) -> RosterResult<Option<SignInOutcome>> {
        let now = self.clock.now();
        let mut inner = self.lock();
        roll_if_due(&mut inner, now)?;
        let Some(id) = inner.roster.selected_record().map(|record| record.id) else {
            return Ok(None);
        };
        inner.roster.sign_in_by_id(id, now.time()).map(Some)
    }

    /// Copies of all active records, oldest sign-out first.
    pub fn active(&self) -> Vec<SignOutRecord> {
        self.lock().roster.snapshot()
    }

    pub fn select(&self, id: RecordId) -> bool {
        self.lock().roster.select(id)
    }

    pub fn clear_selection(&self) {
        self.lock().roster.clear_selection();
    }

    /// Copy of the focused record, if any.
    pub fn selected_record(&self) -> Option<SignOutRecord> {
        self.lock().roster.selected_record().cloned()
    }

    /// Day of the log currently receiving writes.
    pub fn log_date(&self) -> NaiveDate {
        self.lock().roster.log_date()
    }

    /// Runs one rollover check against the clock.
    pub fn tick(&self) -> RosterResult<TickOutcome> {
        let now = self.clock.now();
        let mut inner = self.lock();
        Ok(roll_if_due(&mut inner, now)?)
    }

    fn sign_in_at_instant(
        &self,
        id: RecordId,
        now: NaiveDateTime,
        time: NaiveTime,
    ) -> RosterResult<SignInOutcome> {
        let mut inner = self.lock();
        roll_if_due(&mut inner, now)?;
        inner.roster.sign_in_by_id(id, time)
    }

    fn lock(&self) -> MutexGuard<'_, Inner<L>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L, C> RosterService<L, C>
where
    L: SignOutLog + Send + 'static,
    C: Clock + 'static,
{
    /// Starts a timer that runs `tick` every `interval`.
    ///
    /// The timer holds a weak reference; once the service is dropped ticks
    /// become no-ops. Stop the timer (or drop it) on shutdown.
    pub fn start_rollover_timer(self: &Arc<Self>, interval: Duration) -> std::io::Result<RolloverTimer> {
        let service = Arc::downgrade(self);
        RolloverTimer::start(interval, move || {
            let Some(service) = service.upgrade() else {
                return;
            };
            if let Err(err) = service.tick() {
                error!("event=rollover_tick module=service status=error error={err}");
            }
        })
    }
}

fn roll_if_due<L: SignOutLog>(
    inner: &mut Inner<L>,
    now: NaiveDateTime,
) -> crate::store::StoreResult<TickOutcome> {
    let Inner { roster, scheduler } = inner;
    let outcome = scheduler.tick(now, roster)?;
    if let TickOutcome::RolledOver { to, carried, .. } = outcome {
        info!("event=rollover_applied module=service status=ok date={to} carried={carried}");
    }
    Ok(outcome)
}
