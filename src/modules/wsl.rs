//! Windows Subsystem for Linux.
use anyhow::{Context as _, Result};

use super::registry::ModuleId;
use super::{Context, Handoff, Module, ModuleStats, Outcome, ProcessOpts, resource_stats};
use crate::resources::feature::FeatureResource;

/// Enable the Windows Subsystem for Linux and, optionally, install a
/// distribution.
#[derive(Debug)]
pub struct EnableWsl;

impl Module for EnableWsl {
    fn id(&self) -> ModuleId {
        ModuleId::Wsl
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        if !ctx.platform.is_windows() {
            return Ok(Outcome::Skipped("WSL is Windows-only".to_string()));
        }
        let settings = &ctx.config.settings.wsl;
        let executor = ctx.executor.as_ref();

        let features = settings
            .features()
            .into_iter()
            .map(|name| FeatureResource::new(name, executor));
        let mut stats = resource_stats(ctx, features, &ProcessOpts::apply_all("enable"))?;

        if let Some(distribution) = &settings.distribution {
            stats += install_distribution(ctx, distribution)?;
        }
        Ok(stats.finish(ctx))
    }
}

fn install_distribution(ctx: &Context, distribution: &str) -> Result<ModuleStats> {
    let mut delta = ModuleStats::new();
    let listed = ctx.executor.run_unchecked("wsl", &["--list", "--quiet"])?;
    // `wsl --list` writes UTF-16; dropping NULs is enough for ASCII names.
    let names = listed.stdout.replace('\0', "");
    if listed.success
        && names
            .lines()
            .any(|l| l.trim().eq_ignore_ascii_case(distribution))
    {
        ctx.log.debug(&format!("ok: distribution {distribution}"));
        delta.already_ok += 1;
        return Ok(delta);
    }

    ctx.perform(&format!("install WSL distribution {distribution}"), || {
        ctx.executor
            .run("wsl", &["--install", "-d", distribution, "--no-launch"])
            .with_context(|| format!("installing WSL distribution {distribution}"))?;
        Ok(())
    })?;
    if !ctx.is_dry_run() {
        ctx.log.info(&format!("install: distribution {distribution}"));
    }
    delta.changed += 1;
    Ok(delta)
}
