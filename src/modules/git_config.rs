//! Global git identity and settings.
use anyhow::Result;

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome, ProcessOpts, process_resources};
use crate::resources::git_config::GitConfigResource;

/// Set the global git identity and settings from `git.toml`.
#[derive(Debug)]
pub struct ConfigureGitIdentity;

impl Module for ConfigureGitIdentity {
    fn id(&self) -> ModuleId {
        ModuleId::GitConfig
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let entries = ctx.config.git.entries();
        if entries.is_empty() {
            return Ok(Outcome::Skipped("no git identity configured".to_string()));
        }
        let executor = ctx.executor.as_ref();
        let resources = entries
            .into_iter()
            .map(|(key, value)| GitConfigResource::new(key, value, executor));
        process_resources(ctx, resources, &ProcessOpts::apply_all("set"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::config::git_config::GitIdentity;
    use crate::logging::MemoryLog;
    use crate::modules::test_helpers::{context_with, make_context};
    use crate::platform::Os;
    use crate::resources::test_helpers::MockExecutor;

    fn identity_config() -> Config {
        let mut config = Config::empty(PathBuf::from("/provision"));
        config.git.identity = Some(GitIdentity {
            name: "Sam Doe".to_string(),
            email: "sam@example.com".to_string(),
        });
        config
    }

    #[test]
    fn no_identity_is_skipped() {
        let outcome = ConfigureGitIdentity
            .execute(&make_context(Os::Linux, false), &mut Handoff::default())
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped(_)));
    }

    #[test]
    fn sets_differing_values_only() {
        let executor = Arc::new(
            MockExecutor::with_responses(vec![
                (true, "Sam Doe\n".to_string()),
                (true, "old@example.com\n".to_string()),
                (true, String::new()),
            ])
            .with_which(true),
        );
        let ctx = context_with(
            identity_config(),
            Os::Linux,
            false,
            Arc::clone(&executor) as _,
            Arc::new(MemoryLog::new()),
        );
        ConfigureGitIdentity
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        assert_eq!(
            executor.calls().last().map(String::as_str),
            Some("git config --global user.email sam@example.com")
        );
        assert_eq!(ctx.take_summary().as_deref(), Some("1 changed, 1 already ok"));
    }

    #[test]
    fn missing_git_is_skipped_per_entry() {
        let executor = Arc::new(MockExecutor::default());
        let ctx = context_with(
            identity_config(),
            Os::Windows,
            false,
            Arc::clone(&executor) as _,
            Arc::new(MemoryLog::new()),
        );
        let outcome = ConfigureGitIdentity
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(executor.call_count(), 0);
        assert_eq!(
            ctx.take_summary().as_deref(),
            Some("0 changed, 0 already ok, 2 skipped")
        );
    }
}
