use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rollcall_core::store::row::HEADER;
use rollcall_core::{
    DailyLogStore, ManualClock, RosterConfig, RosterError, RosterService, SignInUpdate,
    SignOutRecord,
};
use std::fs;
use std::path::Path;

fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

fn day_file(dir: &Path, day: u32) -> String {
    let date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
    fs::read_to_string(dir.join(DailyLogStore::file_name("signout_log_", date))).unwrap()
}

#[test]
fn sign_out_then_sign_in_updates_the_day_file() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(at(14, 18, 0, 0));
    let service = RosterService::open(&RosterConfig::new(dir.path()), clock.clone()).unwrap();

    let record = service.sign_out("Doe, Jane", "PX", "555-0100").unwrap();
    assert_eq!(
        day_file(dir.path(), 14),
        format!("{HEADER}\nDoe%Jane,PX,18:00:00,,555-0100\n")
    );
    assert_eq!(service.active().len(), 1);

    clock.set(at(14, 19, 30, 15));
    let outcome = service.sign_in(&record).unwrap();
    assert_eq!(outcome.log, Some(SignInUpdate::Updated { line: 2 }));
    assert_eq!(
        day_file(dir.path(), 14),
        format!("{HEADER}\nDoe%Jane,PX,18:00:00,19:30:15,555-0100\n")
    );
    assert!(service.active().is_empty());
}

#[test]
fn restart_resumes_exactly_the_unresolved_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = RosterConfig::new(dir.path());
    let clock = ManualClock::new(at(14, 8, 0, 0));

    let expected = {
        let service = RosterService::open(&config, clock.clone()).unwrap();
        let gone = service.sign_out("Gonzalez, Drose", "Mall", "198").unwrap();
        clock.set(at(14, 8, 5, 0));
        let stays = service.sign_out("Augstin", "Qudoba", "823").unwrap();
        clock.set(at(14, 8, 10, 0));
        let also_stays = service.sign_out("Byam, Bus", "Dominos", "999").unwrap();
        service.sign_in(&gone).unwrap();
        vec![stays, also_stays]
    };

    let restarted = RosterService::open(&config, clock.clone()).unwrap();
    let resumed = restarted.active();
    assert_eq!(resumed.len(), expected.len());
    for (loaded, original) in resumed.iter().zip(&expected) {
        assert_eq!(loaded.name, original.name);
        assert_eq!(loaded.location, original.location);
        assert_eq!(loaded.phone, original.phone);
        assert_eq!(loaded.time_signed_out, original.time_signed_out);
        assert!(loaded.is_active());
    }
    assert!(restarted.malformed_on_open().is_empty());
}

#[test]
fn duplicate_sign_outs_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let config = RosterConfig::new(dir.path());
    let clock = ManualClock::new(at(14, 9, 0, 0));
    let service = RosterService::open(&config, clock.clone()).unwrap();

    let first = service.sign_out("Doe", "PX", "555").unwrap();
    clock.set(at(14, 10, 0, 0));
    let second = service.sign_out("Doe", "PX", "555").unwrap();
    assert_ne!(first.id, second.id);

    clock.set(at(14, 11, 0, 0));
    service.sign_in(&second).unwrap();
    let active = service.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, first.id);
    assert_eq!(
        day_file(dir.path(), 14),
        format!("{HEADER}\nDoe,PX,09:00:00,,555\nDoe,PX,10:00:00,11:00:00,555\n")
    );

    let restarted = RosterService::open(&config, clock.clone()).unwrap();
    let resumed = restarted.active();
    assert_eq!(resumed.len(), 1);
    assert_eq!(resumed[0].time_signed_out, first.time_signed_out);

    clock.set(at(14, 12, 0, 0));
    restarted.sign_in(&resumed[0]).unwrap();
    assert!(RosterService::open(&config, clock).unwrap().active().is_empty());
}

#[test]
fn signed_in_record_is_never_resurrected() {
    let dir = tempfile::tempdir().unwrap();
    let config = RosterConfig::new(dir.path());
    let clock = ManualClock::new(at(14, 9, 0, 0));
    let service = RosterService::open(&config, clock.clone()).unwrap();

    let record = service.sign_out("McDonnell, Charles", "Personal PT", "128").unwrap();
    service.sign_in_at(&record, hms(9, 45, 0)).unwrap();
    drop(service);

    let store = DailyLogStore::open(dir.path(), "signout_log_", at(14, 0, 0, 0).date()).unwrap();
    assert!(store.load_active().unwrap().records.is_empty());
    assert!(RosterService::open(&config, clock).unwrap().active().is_empty());
}

#[test]
fn case_differences_do_not_match_on_sign_in() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(at(14, 9, 0, 0));
    let service = RosterService::open(&RosterConfig::new(dir.path()), clock.clone()).unwrap();

    let file = dir.path().join("signout_log_2024_06_14.csv");
    let mut raw = fs::read_to_string(&file).unwrap();
    raw.push_str("smith,PX,08:00:00,,555\n");
    fs::write(&file, raw).unwrap();

    let upper = SignOutRecord::new("Smith", "PX", "555", hms(9, 0, 0));
    service.sign_out_record(upper.clone()).unwrap();
    let outcome = service.sign_in(&upper).unwrap();
    assert_eq!(outcome.log, Some(SignInUpdate::Updated { line: 3 }));

    let contents = day_file(dir.path(), 14);
    assert!(contents.contains("smith,PX,08:00:00,,555\n"));
    assert!(contents.contains("Smith,PX,09:00:00,09:00:00,555\n"));
}

#[test]
fn selection_is_exposed_and_cleared_by_sign_in() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(at(14, 9, 0, 0));
    let service = RosterService::open(&RosterConfig::new(dir.path()), clock).unwrap();

    let record = service.sign_out("Johnson, Padrone", "Dominos", "123").unwrap();
    assert!(service.selected_record().is_none());
    assert!(service.select(record.id));
    assert_eq!(service.selected_record().map(|r| r.id), Some(record.id));

    let outcome = service.sign_in_selected().unwrap().unwrap();
    assert_eq!(outcome.record.map(|r| r.id), Some(record.id));
    assert!(service.selected_record().is_none());
    assert!(service.sign_in_selected().unwrap().is_none());
}

#[test]
fn invalid_fields_are_rejected_and_not_logged() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(at(14, 9, 0, 0));
    let service = RosterService::open(&RosterConfig::new(dir.path()), clock).unwrap();

    let err = service.sign_out("Petrilli", "Off post, BWW", "782").unwrap_err();
    assert!(matches!(err, RosterError::Validation(_)));
    assert!(service.active().is_empty());
    assert_eq!(day_file(dir.path(), 14), format!("{HEADER}\n"));
}

#[test]
fn open_reports_skipped_rows() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("signout_log_2024_06_14.csv");
    fs::write(&file, format!("{HEADER}\nbroken\nDoe,PX,08:00:00,,555\n")).unwrap();

    let clock = ManualClock::new(at(14, 9, 0, 0));
    let service = RosterService::open(&RosterConfig::new(dir.path()), clock).unwrap();
    assert_eq!(service.active().len(), 1);
    assert_eq!(service.malformed_on_open().len(), 1);
    assert_eq!(service.malformed_on_open()[0].line, 2);
}
