//! Telemetry opt-out.
use anyhow::Result;

use super::environment::env_target;
use super::registry::ModuleId;
use super::system_config::preference_resources;
use super::{Context, Handoff, Module, ModuleStats, Outcome, ProcessOpts, resource_stats};
use crate::resources::env_var::EnvVarResource;
use crate::resources::service::ServiceResource;

/// Opt out of OS and tool telemetry: policy values, collection services and
/// opt-out environment variables from `telemetry.toml`.
#[derive(Debug)]
pub struct DisableTelemetry;

impl Module for DisableTelemetry {
    fn id(&self) -> ModuleId {
        ModuleId::Telemetry
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let telemetry = &ctx.config.telemetry;
        if telemetry.is_empty() {
            return Ok(Outcome::Skipped(
                "no telemetry settings for this platform".to_string(),
            ));
        }
        let executor = ctx.executor.as_ref();
        let mut stats = ModuleStats::new();

        stats += resource_stats(
            ctx,
            preference_resources(&telemetry.preferences, executor),
            &ProcessOpts::apply_all("set"),
        )?;

        let services = telemetry
            .services
            .iter()
            .map(|s| ServiceResource::new(s.name.clone(), ctx.platform.os, executor));
        stats += resource_stats(ctx, services, &ProcessOpts::apply_all("disable").no_bail())?;

        let target = env_target(ctx);
        let variables = telemetry.variables.iter().map(|v| {
            EnvVarResource::new(v.name.clone(), v.value.clone(), target.clone(), executor)
        });
        stats += resource_stats(ctx, variables, &ProcessOpts::apply_all("set"))?;

        Ok(stats.finish(ctx))
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
    use crate::config::telemetry::ServiceEntry;
    use crate::logging::{Level, MemoryLog};
    use crate::modules::test_helpers::{context_with, make_context};
    use crate::platform::Os;
    use crate::resources::test_helpers::MockExecutor;

    fn windows_config() -> Config {
        let mut config = Config::empty(PathBuf::from("/provision"));
        config.telemetry.services = vec![ServiceEntry {
            name: "DiagTrack".to_string(),
            os: None,
        }];
        config.telemetry.variables = vec![EnvVar {
            name: "DOTNET_CLI_TELEMETRY_OPTOUT".to_string(),
            value: "1".to_string(),
            os: None,
        }];
        config
    }

    #[test]
    fn nothing_configured_is_skipped() {
        let outcome = DisableTelemetry
            .execute(&make_context(Os::Windows, false), &mut Handoff::default())
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped(_)));
    }

    #[test]
    fn disables_service_and_sets_variable() {
        let executor = Arc::new(MockExecutor::with_responses(vec![
            // sc qc
            (true, "        START_TYPE         : 2   AUTO_START\n".to_string()),
            // sc config, sc stop
            (true, String::new()),
            (true, String::new()),
            // reg query (absent)
            (false, String::new()),
            // setx
            (true, String::new()),
        ]));
        let log = Arc::new(MemoryLog::new());
        let ctx = context_with(
            windows_config(),
            Os::Windows,
            false,
            Arc::clone(&executor) as _,
            Arc::clone(&log) as _,
        );
        let outcome = DisableTelemetry
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        assert_eq!(outcome, Outcome::Ok);
        let calls = executor.calls();
        assert_eq!(calls[1], "sc config DiagTrack start= disabled");
        assert_eq!(calls[4], "setx DOTNET_CLI_TELEMETRY_OPTOUT 1");
        assert_eq!(ctx.take_summary().as_deref(), Some("2 changed, 0 already ok"));
        assert!(log.contains(Level::Info, "disable: service DiagTrack"));
    }

    #[test]
    fn dry_run_inspects_but_does_not_mutate() {
        let executor = Arc::new(MockExecutor::with_responses(vec![
            (true, "        START_TYPE         : 2   AUTO_START\n".to_string()),
            (false, String::new()),
        ]));
        let ctx = context_with(
            windows_config(),
            Os::Windows,
            true,
            Arc::clone(&executor) as _,
            Arc::new(MemoryLog::new()),
        );
        let outcome = DisableTelemetry
            .execute(&ctx, &mut Handoff::default())
            .unwrap();
        assert_eq!(outcome, Outcome::DryRun);
        assert_eq!(
            executor.calls(),
            vec![
                "sc qc DiagTrack",
                "reg query HKCU\\Environment /v DOTNET_CLI_TELEMETRY_OPTOUT"
            ]
        );
        assert_eq!(
            ctx.take_intents(),
            vec![
                "would disable service DiagTrack (currently auto_start)",
                "would set: DOTNET_CLI_TELEMETRY_OPTOUT=1",
            ]
        );
    }
}
