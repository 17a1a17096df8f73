//! Provisioning modules and the contract they implement.
pub mod context;
pub mod drivers;
pub mod environment;
pub mod fonts;
pub mod git_config;
pub mod hardware;
pub mod package_manager;
pub mod prerequisites;
mod processing;
pub mod registry;
pub mod script;
pub mod shell_profile;
pub mod software;
pub mod system_config;
pub mod telemetry;
pub mod wsl;

pub use context::Context;
pub use processing::{
    ModuleStats, ProcessOpts, process_resource_states, process_resources, resource_stats,
};

use anyhow::Result;

use crate::error::ResolutionError;
use registry::ModuleId;

/// Outcome of a single module execution.
///
/// # Examples
///
/// ```
/// use provision_cli::modules::Outcome;
///
/// let ok = Outcome::Ok;
/// let skipped = Outcome::Skipped("WSL is Windows-only".into());
/// let dry = Outcome::DryRun;
///
/// assert!(matches!(ok, Outcome::Ok));
/// assert!(matches!(skipped, Outcome::Skipped(_)));
/// assert!(matches!(dry, Outcome::DryRun));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Module completed successfully.
    Ok,
    /// Module had nothing to do on this machine.
    Skipped(String),
    /// Module ran in preview mode; mutations became intents.
    DryRun,
}

/// Data passed explicitly from one module to a later one in the same run.
///
/// The on-disk hardware report is the durable hand-off; the copy kept here
/// lets a dry run (which never writes the file) still preview driver
/// installation.
#[derive(Debug, Default)]
pub struct Handoff {
    /// Report produced by hardware detection, if it ran.
    pub hardware: Option<hardware::HardwareReport>,
}

/// A provisioning unit.
///
/// Implementations must be idempotent: running against an already
/// configured machine only reports "already ok". Every mutation goes
/// through [`process_resources`] or [`Context::perform`] so dry-run is
/// honoured uniformly.
pub trait Module: Send + Sync {
    /// Stable identifier.
    fn id(&self) -> ModuleId;

    /// Human-readable name.
    fn name(&self) -> &str {
        self.id().display_name()
    }

    /// Check that the entry point can be invoked.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] when the entry point is missing.
    fn resolve(&self) -> Result<(), ResolutionError> {
        Ok(())
    }

    /// Execute the module.
    ///
    /// # Errors
    ///
    /// Returns an error when the module fails; the runner turns it into a
    /// failed result and the run continues.
    fn execute(&self, ctx: &Context, handoff: &mut Handoff) -> Result<Outcome>;
}

/// Shared helpers for module unit tests.
#[cfg(test)]
pub mod test_helpers {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::Context;
    use crate::config::Config;
    use crate::dry_run::DryRun;
    use crate::exec::Executor;
    use crate::logging::{Log, MemoryLog};
    use crate::platform::{Os, Platform};
    use crate::resources::package::PackageManager;
    use crate::resources::test_helpers::MockExecutor;

    /// Package manager conventionally present on `os`.
    #[must_use]
    pub const fn manager_for(os: Os) -> PackageManager {
        match os {
            Os::Windows => PackageManager::Winget,
            Os::Linux => PackageManager::Apt,
        }
    }

    /// Build a [`Context`] from explicit parts.
    #[must_use]
    pub fn context_with(
        config: Config,
        os: Os,
        dry_run: bool,
        executor: Arc<dyn Executor>,
        log: Arc<dyn Log>,
    ) -> Context {
        Context::with_home(
            Arc::new(config),
            Arc::new(Platform::new(os, Some(manager_for(os)))),
            log,
            DryRun::new(dry_run),
            executor,
            PathBuf::from("/home/test"),
        )
    }

    /// Context with empty config and a [`MockExecutor`] that has no responses.
    #[must_use]
    pub fn make_context(os: Os, dry_run: bool) -> Context {
        memory_context(os, dry_run).0
    }

    /// Like [`make_context`], also returning the captured log.
    #[must_use]
    pub fn memory_context(os: Os, dry_run: bool) -> (Context, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        let ctx = context_with(
            Config::empty(PathBuf::from("/provision")),
            os,
            dry_run,
            Arc::new(MockExecutor::default()),
            Arc::clone(&log) as Arc<dyn Log>,
        );
        (ctx, log)
    }
}
