//! In-memory roster bound to the current day's log.

use super::{RosterError, RosterResult};
use crate::model::record::{truncate_to_seconds, RecordId, SignOutRecord};
use crate::store::{SignInUpdate, SignOutLog, StoreResult};
use chrono::{NaiveDate, NaiveTime};
use log::{debug, info, warn};

/// Result of a sign-in call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    /// The removed record with its sign-in time, or `None` when the record
    /// was not on the roster.
    pub record: Option<SignOutRecord>,
    /// What happened in the log; `None` when the log was not touched.
    pub log: Option<SignInUpdate>,
}

/// Ordered set of active records plus the log they are persisted to.
#[derive(Debug)]
pub struct RosterState<L: SignOutLog> {
    log: L,
    active: Vec<SignOutRecord>,
    selected: Option<RecordId>,
}

impl<L: SignOutLog> RosterState<L> {
    /// Creates an empty roster writing to `log`.
    pub fn new(log: L) -> Self {
        Self {
            log,
            active: Vec::new(),
            selected: None,
        }
    }

    /// Creates a roster resumed from records already present in `log`.
    ///
    /// Records that carry a sign-in time are dropped.
    pub fn resume(log: L, records: Vec<SignOutRecord>) -> Self {
        let active = records
            .into_iter()
            .filter(SignOutRecord::is_active)
            .collect::<Vec<_>>();
        info!(
            "event=roster_resume module=roster status=ok date={} active={}",
            log.date(),
            active.len()
        );
        Self {
            log,
            active,
            selected: None,
        }
    }

    /// Signs `record` out: persists a row, then appends to the roster.
    ///
    /// `time_signed_out` must already be set by the caller. Identical
    /// name/phone pairs are kept as independent entries.
    ///
    /// # Errors
    /// - `Validation` when a field cannot be stored.
    /// - `AlreadySignedIn` when `record.time_signed_in` is set.
    /// - `Storage` when the log write fails; the roster is unchanged.
    pub fn sign_out(&mut self, record: SignOutRecord) -> RosterResult<RecordId> {
        if !record.is_active() {
            return Err(RosterError::AlreadySignedIn(record.id));
        }
        record.validate()?;
        self.log.append(&record)?;

        let id = record.id;
        self.active.push(record);
        info!(
            "event=roster_sign_out module=roster status=ok record_id={} active={}",
            id,
            self.active.len()
        );
        Ok(id)
    }

    /// Signs the roster entry with `record.id` back in at `time`.
    ///
    /// Removal is by identity, never by re-matching fields. A record that is
    /// not on the roster is a silent no-op.
    ///
    /// # Errors
    /// - `Storage` when the log rewrite fails; the record stays active.
    pub fn sign_in(
        &mut self,
        record: &SignOutRecord,
        time: NaiveTime,
    ) -> RosterResult<SignInOutcome> {
        self.sign_in_by_id(record.id, time)
    }

    /// Same as `sign_in`, keyed by id.
    pub fn sign_in_by_id(&mut self, id: RecordId, time: NaiveTime) -> RosterResult<SignInOutcome> {
        let Some(index) = self.position(id) else {
            debug!("event=roster_sign_in module=roster status=skipped record_id={id} reason=not_active");
            return Ok(SignInOutcome {
                record: None,
                log: None,
            });
        };

        let time = truncate_to_seconds(time);
        let update = self.log.update_sign_in(&self.active[index], time)?;
        if update == SignInUpdate::NoMatchingRow {
            warn!("event=roster_sign_in module=roster status=degraded record_id={id} reason=no_matching_row");
        }

        let mut removed = self.active.remove(index);
        removed.time_signed_in = Some(time);
        if self.selected == Some(id) {
            self.selected = None;
        }
        info!(
            "event=roster_sign_in module=roster status=ok record_id={} active={}",
            id,
            self.active.len()
        );
        Ok(SignInOutcome {
            record: Some(removed),
            log: Some(update),
        })
    }

    /// Returns the active records, oldest sign-out first.
    pub fn active(&self) -> &[SignOutRecord] {
        &self.active
    }

    /// Returns an owned copy of the active records.
    pub fn snapshot(&self) -> Vec<SignOutRecord> {
        self.active.clone()
    }

    pub fn get(&self, id: RecordId) -> Option<&SignOutRecord> {
        self.active.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Focuses the record with `id`; returns `false` when it is not active.
    pub fn select(&mut self, id: RecordId) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Returns the focused record, if any.
    ///
    /// Only a sign-in of that record clears the selection.
    pub fn selected_record(&self) -> Option<&SignOutRecord> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Day of the log currently receiving writes.
    pub fn log_date(&self) -> NaiveDate {
        self.log.date()
    }

    /// Moves every active record into `next` and makes it the current log.
    ///
    /// Each record's `time_signed_out` becomes `at` and `marker` is appended
    /// to its location once. Nothing changes in memory unless the carried
    /// rows were written to `next`. Ids and selection are preserved.
    pub(crate) fn carry_over(&mut self, mut next: L, at: NaiveTime, marker: &str) -> StoreResult<usize> {
        let at = truncate_to_seconds(at);
        let carried = self
            .active
            .iter()
            .map(|record| {
                let mut carried = record.clone();
                carried.time_signed_out = at;
                if !marker.is_empty() && !carried.location.ends_with(marker) {
                    carried.location.push_str(marker);
                }
                carried
            })
            .collect::<Vec<_>>();

        next.append_all(&carried)?;
        let count = carried.len();
        self.active = carried;
        self.log = next;
        Ok(count)
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.active.iter().position(|record| record.id == id)
    }
}
