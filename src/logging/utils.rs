//! Utility functions for log path resolution, ANSI stripping, and time formatting.
use std::path::PathBuf;

use chrono::{DateTime, Local};

/// Environment variable that overrides the run log directory.
pub const LOG_DIR_ENV: &str = "PROVISION_LOG_DIR";

/// Strip ANSI escape sequences from a string.
///
/// Handles SGR sequences (ending in `m`) and other CSI sequences (ending
/// in any letter in the `@`..`~` range), so cursor movement, erase, etc.
/// are also stripped without consuming unrelated text.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if let Some(next) = chars.next()
                && next == '['
            {
                for inner in chars.by_ref() {
                    if ('@'..='~').contains(&inner) {
                        break;
                    }
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// File name of the run log for a run started at `started`.
#[must_use]
pub fn run_log_name(started: &DateTime<Local>) -> String {
    format!("provision-{}.log", started.format("%Y%m%d-%H%M%S"))
}

/// Candidate directories for the run log, most preferred first.
///
/// `$PROVISION_LOG_DIR` wins when set. Otherwise the log goes next to the
/// executable, falling back to the temp directory when the binary lives
/// somewhere unwritable (a network share, a read-only mount).
pub(super) fn log_dir_candidates() -> Vec<PathBuf> {
    if let Ok(dir) = std::env::var(LOG_DIR_ENV) {
        return vec![PathBuf::from(dir)];
    }
    let mut dirs = Vec::with_capacity(2);
    if let Ok(exe) = std::env::current_exe()
        && let Some(parent) = exe.parent()
    {
        dirs.push(parent.to_path_buf());
    }
    dirs.push(std::env::temp_dir());
    dirs
}

/// Format a local timestamp as `HH:MM:SS`.
pub(super) fn format_time(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Format a local timestamp as `YYYY-MM-DD HH:MM:SS`.
pub(super) fn format_datetime(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
