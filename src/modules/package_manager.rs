//! Package manager readiness and index refresh.
use anyhow::{Context as _, Result};

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome};
use crate::error::PreconditionError;

/// Refresh the package manager's sources so later installs see current
/// versions.
///
/// Installing the manager itself happens before any module runs (see
/// [`crate::bootstrap`]); outside a dry run it is guaranteed present here.
#[derive(Debug)]
pub struct BootstrapPackageManager;

impl Module for BootstrapPackageManager {
    fn id(&self) -> ModuleId {
        ModuleId::PackageManager
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let Some(manager) = ctx.platform.package_manager else {
            if ctx.is_dry_run() {
                ctx.record_intent("would install a package manager");
                return Ok(Outcome::DryRun);
            }
            return Err(PreconditionError::BootstrapUnavailable(
                "no supported package manager on PATH".to_string(),
            )
            .into());
        };

        ctx.log.debug(&format!("package manager: {manager}"));
        let (program, args) = manager.refresh_command();
        ctx.perform(&format!("refresh {manager} sources"), || {
            ctx.executor
                .run(program, args)
                .with_context(|| format!("refreshing {manager} sources"))?;
            Ok(())
        })?;

        let summary = format!("{manager} ready");
        ctx.set_summary(summary);
        Ok(if ctx.is_dry_run() {
            Outcome::DryRun
        } else {
            Outcome::Ok
        })
    }
}
