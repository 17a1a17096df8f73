//! `provision` binary entry point.
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;

use provision_cli::cli::Cli;
use provision_cli::commands;
use provision_cli::logging::{self, Logger};

/// Exit status after Ctrl-C.
const INTERRUPTED: i32 = 130;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let started_at = Local::now();
    let log_file = logging::init_subscriber(args.verbose, &started_at);
    let log = Arc::new(Logger::new(log_file));

    if let Err(e) = ctrlc::set_handler(|| {
        tracing::warn!("interrupted; changes already applied are kept, re-run to resume");
        std::process::exit(INTERRUPTED);
    }) {
        log.warn(&format!("could not install Ctrl-C handler: {e}"));
    }

    match commands::provision::run(&args, &log, started_at) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
