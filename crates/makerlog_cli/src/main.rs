//! CLI entry point.
//!
//! # Responsibility
//! - Without arguments: print a smoke probe of `makerlog_core` linkage.
//! - `progress <file.json>`: evaluate a JSON array of milestone drafts and
//!   print progress followed by one `status<TAB>title` line per milestone.

use chrono::Utc;
use log::{error, info};
use makerlog_core::{classify_at, compute_progress, LoggingConfig, MilestoneDraft};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Some(config) = LoggingConfig::from_env() {
        if let Err(err) = config.and_then(makerlog_core::init_logging_with) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            println!("makerlog_core ping={}", makerlog_core::ping());
            println!("makerlog_core version={}", makerlog_core::core_version());
            ExitCode::SUCCESS
        }
        [command, path] if command == "progress" => match run_progress(path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                error!("event=cli_progress module=cli status=error");
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: makerlog_cli [progress <milestones.json>]");
            ExitCode::from(2)
        }
    }
}

fn run_progress(path: &str) -> Result<(), String> {
    let raw = std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    let drafts: Vec<MilestoneDraft> =
        serde_json::from_str(&raw).map_err(|err| format!("invalid milestone JSON: {err}"))?;
    let milestones = drafts
        .iter()
        .map(MilestoneDraft::to_milestone)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| err.to_string())?;

    let now = Utc::now();
    let progress = compute_progress(&milestones, now);
    info!(
        "event=cli_progress module=cli status=ok milestone_count={} progress={progress}",
        milestones.len()
    );

    println!("progress={progress}");
    for milestone in &milestones {
        println!("{}\t{}", classify_at(milestone, now), milestone.title);
    }
    Ok(())
}
