//! The provisioning pass behind the `provision` binary.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::bootstrap;
use crate::cli::Cli;
use crate::config::Config;
use crate::dry_run::DryRun;
use crate::elevation::SystemElevation;
use crate::error::ProvisionError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::modules::Context;
use crate::modules::registry::Registry;
use crate::orchestrator::{Gate, Orchestrator};
use crate::platform::Platform;
use crate::selection::StdioPrompter;

/// Run a provisioning pass.
///
/// Module failures are reported, not returned: they never make this
/// function fail. Quitting the menu or handing over to an elevated copy
/// also returns `Ok`.
///
/// # Errors
///
/// Returns an error when the configuration root cannot be found, a config
/// file cannot be parsed, or no package manager can be bootstrapped.
pub fn run(cli: &Cli, log: &Arc<Logger>, started_at: DateTime<Local>) -> Result<()> {
    let version = option_env!("PROVISION_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("provision {version}"));

    let mut orchestrator = Orchestrator::new(started_at);
    let mut prompter = StdioPrompter;
    let Some(run) = orchestrator.resolve_selection(
        &cli.selection(),
        DryRun::establish(cli.dry_run),
        &mut prompter,
        log.as_ref(),
    ) else {
        log.info("cancelled, nothing was changed");
        return Ok(());
    };
    if run.dry_run().is_active() {
        log.info("dry run: nothing will be changed");
    }

    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor::new(run.dry_run()));
    let platform = Platform::detect(executor.as_ref());
    log.debug(&format!("platform: {}", platform.os));

    log.stage("Loading configuration");
    let (root, config) = load_configuration(cli, &platform)?;
    log.info(&format!("configuration root: {}", root.display()));
    log.debug(&format!(
        "{} software categories, {} fonts, {} driver rules",
        config.software.len(),
        config.fonts.len(),
        config.drivers.len()
    ));

    let elevation = SystemElevation::new(platform.os, Arc::clone(&executor));
    let relaunch_args = cli.relaunch_args(&run, &root);
    let gate = orchestrator.privilege_gate(
        &run,
        &relaunch_args,
        &elevation,
        &mut prompter,
        log.as_ref(),
    );
    if gate == Gate::Relaunched {
        return Ok(());
    }

    let platform =
        bootstrap::ensure_package_manager(platform, executor.as_ref(), run.dry_run(), log.as_ref())
            .map_err(ProvisionError::from)?;

    let registry = Registry::builtin().with_overrides(&config.settings.scripts, &root);
    let ctx = Context::new(
        Arc::new(config),
        Arc::new(platform),
        Arc::clone(log) as Arc<dyn Log>,
        run.dry_run(),
        executor,
    )?;

    let report = orchestrator.run_modules(&run, &registry, &ctx);
    orchestrator.report(&report, log.as_ref(), log.log_path(), cli.report.as_deref());
    Ok(())
}

fn load_configuration(cli: &Cli, platform: &Platform) -> Result<(PathBuf, Config), ProvisionError> {
    let root = super::resolve_root(cli.root.as_deref())?;
    let config = Config::load(&root, platform)?;
    Ok((root, config))
}
