//! Roster diagnostics.
//!
//! # Responsibility
//! - Route the core's `event=...` lines into rotating files under the
//!   configured diagnostics directory.
//! - Capture panics as diagnostic events.
//!
//! # Invariants
//! - Diagnostics start at most once per process; repeating the same
//!   level and directory is accepted, anything else is rejected.
//! - Starting diagnostics never panics.
//! - Events name records by id and carry counts, dates, line numbers and
//!   durations. Names and phone numbers never reach the diagnostics files.
//!
//! # Event vocabulary
//! - `store`: `log_open`, `log_append`, `log_sign_in`, `log_load`
//! - `roster`: `roster_resume`, `roster_sign_out`, `roster_sign_in`
//! - `rollover`: `rollover`, `rollover_timer`
//! - `service`: `rollover_applied`, `rollover_tick`
//! - `logging`: `diagnostics_start`, `panic_captured`

use crate::config::RosterConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DIAGNOSTICS_BASENAME: &str = "rollcall_diagnostics";
const MAX_DIAGNOSTICS_FILE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_DIAGNOSTICS_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static DIAGNOSTICS: OnceCell<Diagnostics> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Severity threshold for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses `trace|debug|info|warn|error`, case-insensitive; `warning`
    /// is accepted for `warn`.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unsupported log level `{other}`; expected trace|debug|info|warn|error"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Diagnostics {
    level: LogLevel,
    dir: PathBuf,
    handle: LoggerHandle,
}

impl Diagnostics {
    fn start(level: LogLevel, dir: PathBuf) -> Result<Self, String> {
        std::fs::create_dir_all(&dir).map_err(|err| {
            format!(
                "failed to create diagnostics directory `{}`: {err}",
                dir.display()
            )
        })?;

        let handle = Logger::try_with_str(level.as_str())
            .map_err(|err| format!("invalid log level `{level}`: {err}"))?
            .log_to_file(
                FileSpec::default()
                    .directory(dir.as_path())
                    .basename(DIAGNOSTICS_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_DIAGNOSTICS_FILE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_DIAGNOSTICS_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("failed to start diagnostics: {err}"))?;

        install_panic_hook_once();
        info!(
            "event=diagnostics_start module=logging status=ok level={} platform={} version={}",
            level,
            std::env::consts::OS,
            env!("CARGO_PKG_VERSION")
        );

        Ok(Self { level, dir, handle })
    }

    fn ensure_same(&self, level: LogLevel, dir: &Path) -> Result<(), String> {
        if self.dir != dir {
            return Err(format!(
                "diagnostics already writing to `{}`; refusing to switch to `{}`",
                self.dir.display(),
                dir.display()
            ));
        }
        if self.level != level {
            return Err(format!(
                "diagnostics already running at level `{}`; refusing to switch to `{}`",
                self.level, level
            ));
        }
        Ok(())
    }
}

/// Starts diagnostics at `level` in the absolute directory `log_dir`.
///
/// # Errors
/// - `level` is not a known level.
/// - `log_dir` is empty, relative, or cannot be created.
/// - Diagnostics already run with a different level or directory.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let level = LogLevel::parse(level)?;
    let dir = absolute_dir(log_dir)?;

    let diagnostics = DIAGNOSTICS.get_or_try_init(|| Diagnostics::start(level, dir.clone()))?;
    diagnostics.ensure_same(level, &dir)
}

/// Starts diagnostics from `config`.
///
/// Returns `Ok(false)` when `config.diagnostics_dir` is unset.
pub fn init_logging_from_config(config: &RosterConfig) -> Result<bool, String> {
    let Some(dir) = &config.diagnostics_dir else {
        return Ok(false);
    };
    init_logging(&config.log_level, &dir.to_string_lossy())?;
    Ok(true)
}

/// Returns `(level, dir)` when diagnostics are running.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    DIAGNOSTICS
        .get()
        .map(|diagnostics| (diagnostics.level.as_str(), diagnostics.dir.clone()))
}

/// Writes buffered diagnostics to disk.
pub fn flush_logging() {
    if let Some(diagnostics) = DIAGNOSTICS.get() {
        diagnostics.handle.flush();
    }
}

/// Returns `debug` for debug builds and `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        LogLevel::Debug.as_str()
    } else {
        LogLevel::Info.as_str()
    }
}

fn absolute_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("diagnostics directory cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!(
            "diagnostics directory must be an absolute path, got `{trimmed}`"
        ));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Panic payloads may quote record fields; keep them short and single-line.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic_captured module=logging status=error location={} payload={}",
            location,
            single_line(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

fn single_line(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
