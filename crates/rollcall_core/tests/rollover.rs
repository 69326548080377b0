use chrono::{Duration, NaiveDate, NaiveDateTime};
use rollcall_core::store::row::HEADER;
use rollcall_core::{
    DailyLogStore, ManualClock, RolloverPhase, RolloverScheduler, RosterConfig, RosterService,
    RosterState, SignOutRecord, TickOutcome,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

const PREFIX: &str = "signout_log_";

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    date(day).and_hms_opt(h, m, s).unwrap()
}

fn read_day(dir: &Path, day: u32) -> String {
    fs::read_to_string(dir.join(DailyLogStore::file_name(PREFIX, date(day)))).unwrap()
}

#[test]
fn same_day_tick_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let store = DailyLogStore::open(dir.path(), PREFIX, date(14)).unwrap();
    let mut roster = RosterState::new(store);
    let mut scheduler = RolloverScheduler::new(date(14), " (carried over)");

    let outcome = scheduler.tick(at(14, 23, 59, 59), &mut roster).unwrap();
    assert_eq!(outcome, TickOutcome::Unchanged);
    assert_eq!(scheduler.phase(), RolloverPhase::Idle(date(14)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn rollover_carries_every_active_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = DailyLogStore::open(dir.path(), PREFIX, date(14)).unwrap();
    let mut roster = RosterState::new(store);
    let first = SignOutRecord::new("Doe, Jane", "PX", "555-0100", at(14, 21, 0, 0).time());
    let second = SignOutRecord::new("Ray", "Dominos", "555-0101", at(14, 22, 0, 0).time());
    let third = SignOutRecord::new("Byam", "Gym", "555-0102", at(14, 22, 30, 0).time());
    roster.sign_out(first.clone()).unwrap();
    roster.sign_out(second.clone()).unwrap();
    roster.sign_out(third.clone()).unwrap();
    roster.sign_in(&second, at(14, 23, 0, 0).time()).unwrap();
    let old_day = read_day(dir.path(), 14);

    let mut scheduler = RolloverScheduler::new(date(14), " (carried over)");
    let outcome = scheduler.tick(at(15, 0, 0, 42), &mut roster).unwrap();

    assert_eq!(
        outcome,
        TickOutcome::RolledOver {
            from: date(14),
            to: date(15),
            carried: 2,
        }
    );
    assert_eq!(scheduler.phase(), RolloverPhase::Idle(date(15)));
    assert_eq!(roster.log_date(), date(15));
    assert_eq!(
        read_day(dir.path(), 15),
        format!(
            "{HEADER}\nDoe%Jane,PX (carried over),00:00:42,,555-0100\nByam,Gym (carried over),00:00:42,,555-0102\n"
        )
    );
    assert_eq!(read_day(dir.path(), 14), old_day);

    let ids = roster.active().iter().map(|r| r.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![first.id, third.id]);
}

#[test]
fn rollover_without_active_records_creates_empty_day() {
    let dir = tempfile::tempdir().unwrap();
    let store = DailyLogStore::open(dir.path(), PREFIX, date(14)).unwrap();
    let mut roster = RosterState::new(store);
    let mut scheduler = RolloverScheduler::new(date(14), " (carried over)");

    let outcome = scheduler.tick(at(15, 0, 1, 0), &mut roster).unwrap();
    assert_eq!(
        outcome,
        TickOutcome::RolledOver {
            from: date(14),
            to: date(15),
            carried: 0,
        }
    );
    assert_eq!(read_day(dir.path(), 15), format!("{HEADER}\n"));
}

#[test]
fn carried_record_signs_in_against_the_new_day() {
    let dir = tempfile::tempdir().unwrap();
    let config = RosterConfig::new(dir.path());
    let clock = ManualClock::new(at(14, 22, 0, 0));
    let service = RosterService::open(&config, clock.clone()).unwrap();
    let record = service.sign_out("Doe, Jane", "PX", "555-0100").unwrap();
    let old_day = read_day(dir.path(), 14);

    clock.set(at(15, 0, 0, 30));
    assert!(matches!(
        service.tick().unwrap(),
        TickOutcome::RolledOver { carried: 1, .. }
    ));
    assert_eq!(service.log_date(), date(15));
    assert_eq!(service.tick().unwrap(), TickOutcome::Unchanged);

    clock.set(at(15, 1, 15, 0));
    service.sign_in(&record).unwrap();
    assert_eq!(
        read_day(dir.path(), 15),
        format!("{HEADER}\nDoe%Jane,PX (carried over),00:00:30,01:15:00,555-0100\n")
    );
    assert_eq!(read_day(dir.path(), 14), old_day);
}

#[test]
fn sign_out_after_midnight_rolls_over_first() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(at(14, 23, 50, 0));
    let service = RosterService::open(&RosterConfig::new(dir.path()), clock.clone()).unwrap();
    service.sign_out("Early", "PX", "1").unwrap();

    clock.set(at(15, 0, 0, 5));
    service.sign_out("Late", "PX", "2").unwrap();

    assert_eq!(
        read_day(dir.path(), 14),
        format!("{HEADER}\nEarly,PX,23:50:00,,1\n")
    );
    assert_eq!(
        read_day(dir.path(), 15),
        format!("{HEADER}\nEarly,PX (carried over),00:00:05,,1\nLate,PX,00:00:05,,2\n")
    );
}

#[test]
fn restart_on_new_day_sees_carried_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = RosterConfig::new(dir.path());
    let clock = ManualClock::new(at(14, 22, 0, 0));
    let service = RosterService::open(&config, clock.clone()).unwrap();
    service.sign_out("Doe", "PX", "555").unwrap();
    clock.set(at(15, 0, 0, 30));
    service.tick().unwrap();
    drop(service);

    let restarted = RosterService::open(&config, clock).unwrap();
    let active = restarted.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].location, "PX (carried over)");
    assert_eq!(active[0].time_signed_out, at(15, 0, 0, 30).time());
}

#[test]
fn timer_started_from_config_drives_rollover() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RosterConfig::new(dir.path());
    config.rollover_interval_secs = 1;
    let clock = ManualClock::new(at(14, 23, 59, 0));
    let service = Arc::new(RosterService::open(&config, clock.clone()).unwrap());
    service.sign_out("Doe", "PX", "555").unwrap();

    let mut timer = service
        .start_rollover_timer(config.rollover_interval())
        .unwrap();
    clock.advance(Duration::minutes(2));

    let mut rolled = false;
    for _ in 0..400 {
        if service.log_date() == date(15) {
            rolled = true;
            break;
        }
        thread::sleep(std::time::Duration::from_millis(10));
    }
    timer.stop();

    assert!(rolled, "timer should have rolled the roster over");
    assert_eq!(
        read_day(dir.path(), 15),
        format!("{HEADER}\nDoe,PX (carried over),00:01:00,,555\n")
    );
}
