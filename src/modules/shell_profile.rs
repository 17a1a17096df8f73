//! Managed block in the shell profile.
use anyhow::Result;

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome, ProcessOpts, process_resources};
use crate::resources::profile_block::ProfileBlockResource;

/// Keep the managed block of the user's shell profile in sync with
/// `shell.toml`. On Windows this is the PowerShell profile.
#[derive(Debug)]
pub struct ConfigureShellProfile;

impl Module for ConfigureShellProfile {
    fn id(&self) -> ModuleId {
        ModuleId::ShellProfile
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let shell = &ctx.config.shell;
        if shell.lines.is_empty() {
            return Ok(Outcome::Skipped("no profile lines configured".to_string()));
        }
        let path = shell.profile_path(ctx.platform.os, &ctx.home);
        ctx.log.debug(&format!("profile: {}", path.display()));
        let block = ProfileBlockResource::new(path, shell.lines.clone());
        process_resources(ctx, [block], &ProcessOpts::apply_all("update"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::dry_run::DryRun;
    use crate::logging::MemoryLog;
    use crate::modules::test_helpers::make_context;
    use crate::platform::{Os, Platform};
    use crate::resources::profile_block::{BLOCK_BEGIN, BLOCK_END};
    use crate::resources::test_helpers::MockExecutor;

    fn context(home: &Path, dry_run: bool) -> Context {
        let mut config = Config::empty(PathBuf::from("/provision"));
        config.shell.lines = vec!["export EDITOR=nvim".to_string()];
        Context::with_home(
            Arc::new(config),
            Arc::new(Platform::new(Os::Linux, None)),
            Arc::new(MemoryLog::new()),
            DryRun::new(dry_run),
            Arc::new(MockExecutor::default()),
            home.to_path_buf(),
        )
    }

    #[test]
    fn no_lines_is_skipped() {
        let outcome = ConfigureShellProfile
            .execute(&make_context(Os::Windows, false), &mut Handoff::default())
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped(_)));
    }

    #[test]
    fn appends_block_preserving_user_content() {
        let home = tempfile::tempdir().unwrap();
        let bashrc = home.path().join(".bashrc");
        std::fs::write(&bashrc, "alias ll='ls -l'\n").unwrap();

        let ctx = context(home.path(), false);
        ConfigureShellProfile
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        let content = std::fs::read_to_string(&bashrc).unwrap();
        assert!(content.starts_with("alias ll='ls -l'\n"));
        assert!(content.contains(&format!("{BLOCK_BEGIN}\nexport EDITOR=nvim\n{BLOCK_END}")));
        assert_eq!(ctx.take_summary().as_deref(), Some("1 changed, 0 already ok"));

        ConfigureShellProfile
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        assert_eq!(ctx.take_summary().as_deref(), Some("0 changed, 1 already ok"));
    }

    #[test]
    fn dry_run_does_not_create_profile() {
        let home = tempfile::tempdir().unwrap();
        let ctx = context(home.path(), true);
        ConfigureShellProfile
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        assert!(!home.path().join(".bashrc").exists());
        assert_eq!(ctx.take_intents().len(), 1);
    }
}
