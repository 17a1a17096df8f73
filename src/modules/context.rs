//! Shared execution context handed to every module.
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::config::Config;
use crate::dry_run::DryRun;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Platform;

/// Shared context for module execution.
///
/// Built once per run and passed by reference; nothing here is global. The
/// intent and summary slots are drained by the runner after each module.
pub struct Context {
    /// Configuration loaded from `<root>/conf/`.
    pub config: Arc<Config>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Logger for output.
    pub log: Arc<dyn Log>,
    /// Preview mode for this run.
    pub dry_run: DryRun,
    /// User's home directory path.
    pub home: PathBuf,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    intents: Mutex<Vec<String>>,
    summary: Mutex<Option<String>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a new context for module execution.
    ///
    /// # Errors
    ///
    /// Returns an error if the HOME (or USERPROFILE on Windows) environment
    /// variable is not set.
    pub fn new(
        config: Arc<Config>,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        dry_run: DryRun,
        executor: Arc<dyn Executor>,
    ) -> Result<Self> {
        let home = if cfg!(target_os = "windows") {
            std::env::var("USERPROFILE")
                .or_else(|_| std::env::var("HOME"))
                .map_err(|_| {
                    anyhow::anyhow!("neither USERPROFILE nor HOME environment variable is set")
                })?
        } else {
            std::env::var("HOME")
                .map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))?
        };
        Ok(Self::with_home(
            config,
            platform,
            log,
            dry_run,
            executor,
            PathBuf::from(home),
        ))
    }

    /// Creates a context with an explicit home directory.
    #[must_use]
    pub fn with_home(
        config: Arc<Config>,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        dry_run: DryRun,
        executor: Arc<dyn Executor>,
        home: PathBuf,
    ) -> Self {
        Self {
            config,
            platform,
            log,
            dry_run,
            home,
            executor,
            intents: Mutex::new(Vec::new()),
            summary: Mutex::new(None),
        }
    }

    /// Return a copy of this context that logs to `log`.
    #[must_use]
    pub fn with_log(&self, log: Arc<dyn Log>) -> Self {
        Self::with_home(
            Arc::clone(&self.config),
            Arc::clone(&self.platform),
            log,
            self.dry_run,
            Arc::clone(&self.executor),
            self.home.clone(),
        )
    }

    /// `true` during a preview run.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run.is_active()
    }

    /// Configuration root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Directory for inter-module artifacts.
    #[must_use]
    pub fn artifacts_dir(&self) -> PathBuf {
        self.config.artifacts_dir()
    }

    /// Record what a mutation would have done instead of doing it.
    pub fn record_intent(&self, intent: &str) {
        self.log.dry_run(intent);
        if let Ok(mut intents) = self.intents.lock() {
            intents.push(intent.to_string());
        }
    }

    /// Drain intents recorded since the last call.
    #[must_use]
    pub fn take_intents(&self) -> Vec<String> {
        self.intents
            .lock()
            .map(|mut i| std::mem::take(&mut *i))
            .unwrap_or_default()
    }

    /// Store the one-line summary for the current module.
    pub fn set_summary(&self, summary: String) {
        if let Ok(mut slot) = self.summary.lock() {
            *slot = Some(summary);
        }
    }

    /// Drain the summary stored by the current module.
    #[must_use]
    pub fn take_summary(&self) -> Option<String> {
        self.summary.lock().ok().and_then(|mut s| s.take())
    }

    /// Run a state-mutating `action`, or record `would {what}` in a dry run.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `action`.
    pub fn perform(&self, what: &str, action: impl FnOnce() -> Result<()>) -> Result<()> {
        if self.is_dry_run() {
            self.record_intent(&format!("would {what}"));
            return Ok(());
        }
        action()?;
        self.log.debug(what);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::{Level, MemoryLog};
    use crate::modules::test_helpers::{make_context, memory_context};
    use crate::platform::Os;

    #[test]
    fn perform_runs_action_for_real() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        let mut ran = false;
        ctx.perform("write file", || {
            ran = true;
            Ok(())
        })
        .unwrap();
        assert!(ran);
        assert!(ctx.take_intents().is_empty());
    }

    #[test]
    fn perform_records_intent_in_dry_run() {
        let (ctx, log) = memory_context(Os::Linux, true);
        let mut ran = false;
        ctx.perform("write file", || {
            ran = true;
            Ok(())
        })
        .unwrap();
        assert!(!ran);
        assert_eq!(ctx.take_intents(), vec!["would write file"]);
        assert!(ctx.take_intents().is_empty());
        assert!(log.contains(Level::DryRun, "would write file"));
    }

    #[test]
    fn perform_propagates_errors() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        assert!(ctx.perform("fail", || anyhow::bail!("nope")).is_err());
    }

    #[test]
    fn summary_slot_drains() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        ctx.set_summary("3 changed".to_string());
        assert_eq!(ctx.take_summary().as_deref(), Some("3 changed"));
        assert!(ctx.take_summary().is_none());
    }

    #[test]
    fn with_log_swaps_logger() {
        let ctx = make_context(Os::Windows, false);
        let log = Arc::new(MemoryLog::new());
        let swapped = ctx.with_log(Arc::clone(&log) as Arc<dyn Log>);
        swapped.log.info("hello");
        assert!(log.contains(Level::Info, "hello"));
        assert_eq!(swapped.platform.os, Os::Windows);
    }
}
