//! Core logging types: the [`Log`] trait and message levels.

/// Kind of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Major section header.
    Stage,
    /// Informational message.
    Info,
    /// Verbose-only message.
    Debug,
    /// Warning.
    Warn,
    /// Error.
    Error,
    /// Dry-run intent ("would …").
    DryRun,
}

/// Abstraction over logging backends.
///
/// Both [`Logger`](super::logger::Logger) (console + run log) and
/// [`MemoryLog`](super::memory::MemoryLog) (captured entries) implement this
/// trait, allowing module code to log without knowing where output goes.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
}
