//! Command-line front end for the roster core.
//!
//! # Responsibility
//! - Drive sign-out, sign-in and rollover from a terminal.
//! - Keep output plain and line-oriented for quick desk checks.
//!
//! Usage:
//! - `rollcall version`
//! - `rollcall <log_dir|--config file.json> list`
//! - `rollcall <log_dir|--config file.json> out <name> <location> <phone>`
//! - `rollcall <log_dir|--config file.json> in <index>`
//! - `rollcall <log_dir|--config file.json> tick`
//! - `rollcall <log_dir|--config file.json> watch`: keeps the roster open,
//!   rolls over every `rollover_interval_secs`, and reads commands from
//!   stdin (`list`, `out NAME; LOCATION; PHONE`, `in INDEX`, `tick`, `quit`).

use log::{error, info};
use rollcall_core::{
    core_version, init_logging_from_config, DailyLogStore, RosterConfig, RosterService,
    SignOutRecord, SystemClock, TickOutcome,
};
use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;

const USAGE: &str = "usage: rollcall version | rollcall <log_dir|--config file.json> <list|out NAME LOCATION PHONE|in INDEX|tick|watch>";
const WATCH_HELP: &str = "commands: list | out NAME; LOCATION; PHONE | in INDEX | tick | quit";

type Service = RosterService<DailyLogStore, SystemClock>;

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    if args.first().map(String::as_str) == Some("version") {
        println!("rollcall_core version={}", core_version());
        return Ok(());
    }

    let (config, rest) = match args {
        [flag, path, rest @ ..] if flag == "--config" => (
            RosterConfig::load(path).map_err(|err| err.to_string())?,
            rest,
        ),
        [log_dir, rest @ ..] => (RosterConfig::new(log_dir), rest),
        [] => return Err(USAGE.to_string()),
    };

    init_logging_from_config(&config)?;

    let service = RosterService::open(&config, SystemClock).map_err(|err| {
        error!("event=cli_open module=cli status=error error={err}");
        err.to_string()
    })?;
    for row in service.malformed_on_open() {
        eprintln!("skipped {row}");
    }

    match rest {
        [command] if command == "watch" => watch(Arc::new(service), &config),
        [command] if command == "list" => {
            print_roster(&service.active());
            Ok(())
        }
        [command, name, location, phone] if command == "out" => {
            sign_out(&service, name, location, phone)
        }
        [command, index] if command == "in" => sign_in(&service, index),
        [command] if command == "tick" => tick(&service),
        _ => Err(USAGE.to_string()),
    }
}

/// Serves stdin commands while the rollover timer runs.
fn watch(service: Arc<Service>, config: &RosterConfig) -> Result<(), String> {
    let mut timer = service
        .start_rollover_timer(config.rollover_interval())
        .map_err(|err| format!("failed to start rollover timer: {err}"))?;
    info!(
        "event=cli_watch module=cli status=start interval_secs={}",
        config.rollover_interval_secs
    );
    println!("{WATCH_HELP}");
    print_roster(&service.active());

    for line in std::io::stdin().lock().lines() {
        let line = line.map_err(|err| format!("failed to read stdin: {err}"))?;
        let line = line.trim();
        let (command, arguments) = line.split_once(' ').unwrap_or((line, ""));
        let result = match command {
            "" => Ok(()),
            "quit" | "exit" => break,
            "list" => {
                print_roster(&service.active());
                Ok(())
            }
            "tick" => tick(&service),
            "in" => sign_in(&service, arguments.trim()),
            "out" => match arguments.split(';').map(str::trim).collect::<Vec<_>>()[..] {
                [name, location, phone] => sign_out(&service, name, location, phone),
                _ => Err("usage: out NAME; LOCATION; PHONE".to_string()),
            },
            _ => Err(WATCH_HELP.to_string()),
        };
        if let Err(message) = result {
            eprintln!("{message}");
        }
    }

    timer.stop();
    info!("event=cli_watch module=cli status=ok action=stop");
    Ok(())
}

fn sign_out(service: &Service, name: &str, location: &str, phone: &str) -> Result<(), String> {
    let record = service
        .sign_out(name, location, phone)
        .map_err(|err| err.to_string())?;
    println!(
        "signed out {record} at {}",
        record.time_signed_out.format("%H:%M:%S")
    );
    print_roster(&service.active());
    Ok(())
}

fn sign_in(service: &Service, index: &str) -> Result<(), String> {
    let active = service.active();
    let record = index
        .parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| active.get(index))
        .ok_or_else(|| format!("no active record at index `{index}`"))?;
    let outcome = service.sign_in(record).map_err(|err| err.to_string())?;
    if let Some(signed_in) = outcome.record {
        println!("signed in {signed_in}");
    }
    print_roster(&service.active());
    Ok(())
}

fn tick(service: &Service) -> Result<(), String> {
    match service.tick().map_err(|err| err.to_string())? {
        TickOutcome::Unchanged => println!("log date {} unchanged", service.log_date()),
        TickOutcome::RolledOver { from, to, carried } => {
            println!("rolled over {from} -> {to}, carried {carried}")
        }
    }
    Ok(())
}

fn print_roster(records: &[SignOutRecord]) {
    if records.is_empty() {
        println!("nobody signed out");
        return;
    }
    for (index, record) in records.iter().enumerate() {
        println!(
            "{:>3}. {:<30} {:<30} {:<14} out {}",
            index + 1,
            record.display_name(),
            record.location,
            record.phone,
            record.time_signed_out.format("%H:%M:%S")
        );
    }
}
