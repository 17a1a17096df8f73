//! User environment variables.
use anyhow::Result;

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome, ProcessOpts, process_resources};
use crate::platform::Os;
use crate::resources::env_var::{EnvTarget, EnvVarResource};

/// Persist the user environment variables from `environment.toml`.
#[derive(Debug)]
pub struct ConfigureEnvironment;

impl Module for ConfigureEnvironment {
    fn id(&self) -> ModuleId {
        ModuleId::Environment
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let variables = &ctx.config.environment;
        if variables.is_empty() {
            return Ok(Outcome::Skipped("no environment variables configured".to_string()));
        }
        let target = env_target(ctx);
        let executor = ctx.executor.as_ref();
        let resources = variables.iter().map(|v| {
            EnvVarResource::new(v.name.clone(), v.value.clone(), target.clone(), executor)
        });
        process_resources(ctx, resources, &ProcessOpts::apply_all("set"))
    }
}

/// Where user variables are persisted on the current platform.
pub(super) fn env_target(ctx: &Context) -> EnvTarget {
    match ctx.platform.os {
        Os::Windows => EnvTarget::WindowsUser,
        Os::Linux => EnvTarget::environment_d(&ctx.home),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::config::environment::EnvVar;
    use crate::dry_run::DryRun;
    use crate::logging::MemoryLog;
    use crate::modules::test_helpers::make_context;
    use crate::platform::Platform;
    use crate::resources::env_var::ENVIRONMENT_D_FILE;
    use crate::resources::test_helpers::MockExecutor;

    fn linux_context(home: PathBuf, dry_run: bool) -> Context {
        let mut config = Config::empty(PathBuf::from("/provision"));
        config.environment = vec![
            EnvVar {
                name: "EDITOR".to_string(),
                value: "nvim".to_string(),
                os: None,
            },
            EnvVar {
                name: "PAGER".to_string(),
                value: "less".to_string(),
                os: None,
            },
        ];
        Context::with_home(
            Arc::new(config),
            Arc::new(Platform::new(Os::Linux, None)),
            Arc::new(MemoryLog::new()),
            DryRun::new(dry_run),
            Arc::new(MockExecutor::default()),
            home,
        )
    }

    #[test]
    fn target_follows_platform() {
        assert_eq!(
            env_target(&make_context(Os::Windows, false)),
            EnvTarget::WindowsUser
        );
        assert_eq!(
            env_target(&make_context(Os::Linux, false)),
            EnvTarget::EnvironmentD(PathBuf::from("/home/test").join(ENVIRONMENT_D_FILE))
        );
    }

    #[test]
    fn writes_drop_in_and_is_idempotent() {
        let home = tempfile::tempdir().unwrap();
        let ctx = linux_context(home.path().to_path_buf(), false);
        let outcome = ConfigureEnvironment
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        assert_eq!(outcome, Outcome::Ok);
        let content = std::fs::read_to_string(home.path().join(ENVIRONMENT_D_FILE)).unwrap();
        assert!(content.contains("EDITOR=nvim"));
        assert!(content.contains("PAGER=less"));
        assert_eq!(ctx.take_summary().as_deref(), Some("2 changed, 0 already ok"));

        ConfigureEnvironment
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        assert_eq!(ctx.take_summary().as_deref(), Some("0 changed, 2 already ok"));
    }

    #[test]
    fn dry_run_leaves_home_untouched() {
        let home = tempfile::tempdir().unwrap();
        let ctx = linux_context(home.path().to_path_buf(), true);
        let outcome = ConfigureEnvironment
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        assert_eq!(outcome, Outcome::DryRun);
        assert!(!home.path().join(ENVIRONMENT_D_FILE).exists());
        assert_eq!(ctx.take_intents().len(), 2);
    }
}
