//! Vendor driver packages chosen from the hardware report.
use anyhow::Result;

use super::hardware::{HardwareReport, artifact_path};
use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome, ProcessOpts, process_resource_states};
use crate::error::HandOffError;
use crate::resources::package::{PackageResource, installed_packages};

/// Install vendor driver packages matching the detected hardware.
///
/// Reads the report written by hardware detection. When it is absent the
/// module fails fast with [`HandOffError::MissingArtifact`]; a dry run
/// falls back to the report detected earlier in the same run, since the
/// preview never writes the file.
#[derive(Debug)]
pub struct InstallDrivers;

impl InstallDrivers {
    fn load_report(ctx: &Context, handoff: &Handoff) -> Result<HardwareReport, HandOffError> {
        let path = artifact_path(ctx);
        match HardwareReport::read(&path) {
            Err(HandOffError::MissingArtifact(_)) if ctx.is_dry_run() => {
                handoff.hardware.clone().ok_or(HandOffError::MissingArtifact(path))
            }
            other => other,
        }
    }
}

impl Module for InstallDrivers {
    fn id(&self) -> ModuleId {
        ModuleId::DriverInstall
    }

    fn execute(&self, ctx: &Context, handoff: &mut Handoff) -> Result<Outcome> {
        let report = Self::load_report(ctx, handoff)?;

        let matched: Vec<_> = ctx
            .config
            .drivers
            .iter()
            .filter(|rule| report.has_vendor(rule.vendor, rule.class))
            .collect();
        if matched.is_empty() {
            return Ok(Outcome::Skipped(
                "no driver rules match the detected hardware".to_string(),
            ));
        }
        let Some(manager) = ctx.platform.package_manager else {
            return Ok(Outcome::Skipped("no package manager available".to_string()));
        };

        let executor = ctx.executor.as_ref();
        let installed = installed_packages(manager, executor, &*ctx.log)?;
        let resource_states = matched.into_iter().map(|rule| {
            ctx.log
                .debug(&format!("{:?} hardware present: {}", rule.vendor, rule.package));
            let resource = PackageResource::new(rule.package.clone(), manager, executor)
                .with_source(rule.source.clone());
            let state = resource.state_from_installed(&installed);
            (resource, state)
        });
        process_resource_states(ctx, resource_states, &ProcessOpts::install_missing("install"))
    }
}
