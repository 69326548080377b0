//! File-backed daily sign-out log.
//!
//! # Responsibility
//! - Resolve one CSV file per calendar day and create it with a header.
//! - Append sign-out rows durably and fill in sign-in times by rewrite.
//! - Reload active rows after a restart.
//!
//! # Invariants
//! - Existing rows are never reordered or removed.
//! - Appends are synced to disk before returning.
//! - Sign-in rewrites replace the file via a synced temporary sibling.

use super::matcher::matches;
use super::row::{encode_row, format_time, with_time_in, MalformedRow, RawRow, HEADER};
use super::{SignInUpdate, SignOutLog, StoreAction, StoreError, StoreResult};
use crate::model::record::SignOutRecord;
use chrono::{NaiveDate, NaiveTime};
use log::{error, info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// Date part of a daily log file name.
pub const FILE_DATE_FORMAT: &str = "%Y_%m_%d";
/// Extension of daily log files.
pub const FILE_EXTENSION: &str = "csv";

/// Active records recovered from a daily log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveLoad {
    /// Rows with an empty `TimeIn`, in file order.
    pub records: Vec<SignOutRecord>,
    /// Rows that were skipped.
    pub malformed: Vec<MalformedRow>,
}

/// Sign-out log for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyLogStore {
    dir: PathBuf,
    prefix: String,
    date: NaiveDate,
    path: PathBuf,
}

impl DailyLogStore {
    /// Opens the log for `date`, creating it with a header row if missing.
    ///
    /// # Errors
    /// - `StorageUnavailable` when the directory or file cannot be created
    ///   or written.
    pub fn open(dir: impl AsRef<Path>, prefix: &str, date: NaiveDate) -> StoreResult<Self> {
        let started_at = Instant::now();
        let dir = dir.as_ref().to_path_buf();
        let path = log_path(&dir, prefix, date);
        info!("event=log_open module=store status=start date={date}");

        match ensure_log_file(&dir, &path) {
            Ok(created) => {
                info!(
                    "event=log_open module=store status=ok date={} created={} duration_ms={}",
                    date,
                    created,
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    dir,
                    prefix: prefix.to_string(),
                    date,
                    path,
                })
            }
            Err(err) => {
                error!(
                    "event=log_open module=store status=error date={} duration_ms={} error_code=storage_unavailable error={}",
                    date,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Returns the deterministic file name for `date`.
    pub fn file_name(prefix: &str, date: NaiveDate) -> String {
        format!(
            "{prefix}{}.{FILE_EXTENSION}",
            date.format(FILE_DATE_FORMAT)
        )
    }

    /// Loads active records for `date` without creating the file.
    ///
    /// A missing file yields an empty load.
    pub fn load_active_for(
        dir: impl AsRef<Path>,
        prefix: &str,
        date: NaiveDate,
    ) -> StoreResult<ActiveLoad> {
        read_active(&log_path(dir.as_ref(), prefix, date), date)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Appends one active row.
    pub fn append(&mut self, record: &SignOutRecord) -> StoreResult<()> {
        self.append_all(std::slice::from_ref(record))
    }

    /// Appends rows for `records` in order with one synced write.
    pub fn append_all(&mut self, records: &[SignOutRecord]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        for record in records {
            record.validate()?;
        }

        let mut payload = String::new();
        for record in records {
            payload.push_str(&encode_row(record));
            payload.push('\n');
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|err| StoreError::unavailable(&self.path, StoreAction::Open, err))?;
        file.write_all(payload.as_bytes())
            .map_err(|err| StoreError::unavailable(&self.path, StoreAction::Write, err))?;
        file.sync_data()
            .map_err(|err| StoreError::unavailable(&self.path, StoreAction::Sync, err))?;

        info!(
            "event=log_append module=store status=ok date={} rows={}",
            self.date,
            records.len()
        );
        Ok(())
    }

    /// Fills in the sign-in time of the active row matching `record`.
    ///
    /// Among active rows with the same name and phone, the one whose
    /// `TimeOut` equals `record.time_signed_out` wins; otherwise the first.
    /// Reads the whole file and rewrites it; unmatched calls leave the file
    /// untouched and return `SignInUpdate::NoMatchingRow`.
    pub fn update_sign_in(
        &mut self,
        record: &SignOutRecord,
        time: NaiveTime,
    ) -> StoreResult<SignInUpdate> {
        let started_at = Instant::now();
        let content = fs::read_to_string(&self.path)
            .map_err(|err| StoreError::unavailable(&self.path, StoreAction::Read, err))?;

        let mut lines = content.lines().map(str::to_string).collect::<Vec<_>>();
        let target = find_sign_in_target(&lines, record);

        let Some(index) = target else {
            warn!(
                "event=log_sign_in module=store status=skipped date={} record_id={} reason=no_matching_row",
                self.date, record.id
            );
            return Ok(SignInUpdate::NoMatchingRow);
        };

        lines[index] = with_time_in(&lines[index], time);
        let mut rewritten = lines.join("\n");
        rewritten.push('\n');
        self.replace_contents(&rewritten)?;

        info!(
            "event=log_sign_in module=store status=ok date={} line={} duration_ms={}",
            self.date,
            index + 1,
            started_at.elapsed().as_millis()
        );
        Ok(SignInUpdate::Updated { line: index + 1 })
    }

    /// Loads all rows with an empty `TimeIn`, skipping malformed ones.
    pub fn load_active(&self) -> StoreResult<ActiveLoad> {
        read_active(&self.path, self.date)
    }

    fn replace_contents(&self, contents: &str) -> StoreResult<()> {
        let mut staged = NamedTempFile::new_in(&self.dir)
            .map_err(|err| StoreError::unavailable(&self.dir, StoreAction::Create, err))?;
        staged
            .write_all(contents.as_bytes())
            .map_err(|err| StoreError::unavailable(staged.path(), StoreAction::Write, err))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|err| StoreError::unavailable(staged.path(), StoreAction::Sync, err))?;
        staged
            .persist(&self.path)
            .map_err(|err| StoreError::unavailable(&self.path, StoreAction::Replace, err.error))?;
        Ok(())
    }
}

impl SignOutLog for DailyLogStore {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn append(&mut self, record: &SignOutRecord) -> StoreResult<()> {
        DailyLogStore::append(self, record)
    }

    fn append_all(&mut self, records: &[SignOutRecord]) -> StoreResult<()> {
        DailyLogStore::append_all(self, records)
    }

    fn update_sign_in(
        &mut self,
        record: &SignOutRecord,
        time: NaiveTime,
    ) -> StoreResult<SignInUpdate> {
        DailyLogStore::update_sign_in(self, record, time)
    }

    fn open_sibling(&self, date: NaiveDate) -> StoreResult<Self> {
        Self::open(&self.dir, &self.prefix, date)
    }
}

/// Index of the row a sign-in of `record` resolves.
///
/// The header never matches: its `TimeIn` field is not empty.
fn find_sign_in_target(lines: &[String], record: &SignOutRecord) -> Option<usize> {
    let time_out = format_time(record.time_signed_out);
    let mut first_match = None;
    for (index, line) in lines.iter().enumerate() {
        let Ok(row) = RawRow::split(line) else {
            continue;
        };
        if !row.is_active() || !matches(row.stored_name, row.phone, record) {
            continue;
        }
        if row.time_out == time_out {
            return Some(index);
        }
        first_match.get_or_insert(index);
    }
    first_match
}

fn log_path(dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    dir.join(DailyLogStore::file_name(prefix, date))
}

/// Creates `path` with a header when missing or empty.
///
/// Returns whether a header was written.
fn ensure_log_file(dir: &Path, path: &Path) -> StoreResult<bool> {
    fs::create_dir_all(dir)
        .map_err(|err| StoreError::unavailable(dir, StoreAction::CreateDir, err))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| StoreError::unavailable(path, StoreAction::Create, err))?;
    let len = file
        .metadata()
        .map_err(|err| StoreError::unavailable(path, StoreAction::Open, err))?
        .len();
    if len > 0 {
        return Ok(false);
    }

    writeln!(file, "{HEADER}")
        .map_err(|err| StoreError::unavailable(path, StoreAction::Write, err))?;
    sync(&file, path)?;
    Ok(true)
}

fn sync(file: &File, path: &Path) -> StoreResult<()> {
    file.sync_all()
        .map_err(|err| StoreError::unavailable(path, StoreAction::Sync, err))
}

fn read_active(path: &Path, date: NaiveDate) -> StoreResult<ActiveLoad> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ActiveLoad::default()),
        Err(err) => return Err(StoreError::unavailable(path, StoreAction::Read, err)),
    };

    let mut load = ActiveLoad::default();
    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if (index == 0 && line == HEADER) || line.trim().is_empty() {
            continue;
        }
        let decoded = RawRow::split(line).and_then(|row| {
            if row.is_active() {
                row.into_record().map(Some)
            } else {
                Ok(None)
            }
        });
        match decoded {
            Ok(Some(record)) => load.records.push(record),
            Ok(None) => {}
            Err(reason) => {
                warn!(
                    "event=log_load module=store status=skipped date={date} line={line_number} reason=malformed_row"
                );
                load.malformed.push(MalformedRow {
                    line: line_number,
                    reason,
                });
            }
        }
    }

    info!(
        "event=log_load module=store status=ok date={} active={} malformed={}",
        date,
        load.records.len(),
        load.malformed.len()
    );
    Ok(load)
}
