//! Console + run-log logger.
use std::path::{Path, PathBuf};

use super::types::Log;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness.
///
/// Messages go through [`tracing`]; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) prints them to
/// the console and appends every one of them (debug included) to the run
/// log with a `[HH:MM:SS]` prefix.
#[derive(Debug, Default)]
pub struct Logger {
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// `log_file` is the run log opened by the subscriber, kept only so the
    /// summary can point at it. `None` means console-only output.
    #[must_use]
    pub const fn new(log_file: Option<PathBuf>) -> Self {
        Self { log_file }
    }

    /// Return the run log path, if one was opened.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: "provision::stage", "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the run log).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: "provision::dry_run", "{msg}");
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn logger_without_file() {
        let log = Logger::new(None);
        assert!(log.log_path().is_none());
        // No subscriber installed: calls are no-ops and must not panic.
        log.stage("stage");
        log.dry_run("would do something");
    }

    #[test]
    fn logger_reports_its_file() {
        let log = Logger::new(Some(PathBuf::from("/tmp/provision.log")));
        assert_eq!(log.log_path(), Some(Path::new("/tmp/provision.log")));
    }

    #[test]
    fn logger_usable_as_trait_object() {
        let log: std::sync::Arc<dyn Log> = std::sync::Arc::new(Logger::default());
        log.info("hello");
        log.warn("careful");
    }
}
