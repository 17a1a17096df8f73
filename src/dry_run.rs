//! Process-wide dry-run flag.
//!
//! Dry-run is decided once, before any module executes, and is then carried
//! explicitly in [`Context`](crate::modules::Context). The one exception is
//! the subprocess boundary: modules backed by external scripts cannot see the
//! in-memory context, so every command spawned through
//! [`SystemExecutor`](crate::exec::SystemExecutor) receives the
//! [`DRY_RUN_ENV`] variable. Scripts must read that variable at their own
//! entry point rather than trusting arguments.
//!
//! # Examples
//!
//! ```
//! use provision_cli::dry_run::DryRun;
//!
//! let preview = DryRun::new(true);
//! assert!(preview.is_active());
//! assert_eq!(preview.env_value(), "1");
//! assert!(DryRun::parse_env_value("TRUE"));
//! assert!(!DryRun::parse_env_value("0"));
//! ```

/// Environment variable exported to every subprocess.
pub const DRY_RUN_ENV: &str = "PROVISION_DRY_RUN";

/// Whether the current invocation is a preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DryRun(bool);

impl DryRun {
    /// Wrap an explicit flag value.
    #[must_use]
    pub const fn new(active: bool) -> Self {
        Self(active)
    }

    /// Read the flag inherited from a parent process.
    #[must_use]
    pub fn from_env() -> Self {
        Self(
            std::env::var(DRY_RUN_ENV)
                .ok()
                .is_some_and(|v| Self::parse_env_value(&v)),
        )
    }

    /// Establish the flag for this invocation.
    ///
    /// A dry run requested on the command line or inherited from the
    /// environment wins; the flag can only be turned on, never off.
    #[must_use]
    pub fn establish(cli_flag: bool) -> Self {
        Self(cli_flag || Self::from_env().0)
    }

    /// Interpret an environment value (`1`, `true`, `yes`, case-insensitive).
    #[must_use]
    pub fn parse_env_value(value: &str) -> bool {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        )
    }

    /// `true` when no persistent state may be mutated.
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.0
    }

    /// Value exported in [`DRY_RUN_ENV`].
    #[must_use]
    pub const fn env_value(self) -> &'static str {
        if self.0 { "1" } else { "0" }
    }
}

impl From<bool> for DryRun {
    fn from(active: bool) -> Self {
        Self(active)
    }
}
