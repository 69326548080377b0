//! Wall-clock abstraction.
//!
//! Roster operations read "now" exactly once per call through `Clock`, so
//! tests and simulations can drive dates and times deterministically.

use chrono::{Duration, Local, NaiveDateTime};
use std::sync::{Arc, Mutex, PoisonError};

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock shared between a test and the code under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock};
    use chrono::{Duration, NaiveDate};

    #[test]
    fn manual_clock_clones_share_time() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, 30)
            .unwrap();
        let clock = ManualClock::new(start);
        let observer = clock.clone();

        clock.advance(Duration::seconds(45));
        assert_eq!(
            observer.now(),
            NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(0, 0, 15)
                .unwrap()
        );
    }
}
