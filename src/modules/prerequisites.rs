//! Tools every later module relies on.
use anyhow::Result;

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome, ProcessOpts, process_resources};
use crate::resources::package::PackageResource;
use crate::resources::tool::ToolResource;

/// Ensure the tools later modules shell out to are on `PATH`.
#[derive(Debug)]
pub struct InstallPrerequisites;

impl Module for InstallPrerequisites {
    fn id(&self) -> ModuleId {
        ModuleId::Prerequisites
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let prerequisites = &ctx.config.settings.prerequisites;
        if prerequisites.is_empty() {
            return Ok(Outcome::Skipped("no prerequisites configured".to_string()));
        }

        let executor = ctx.executor.as_ref();
        let manager = ctx.platform.package_manager;
        let resources = prerequisites.iter().map(|p| {
            let package = p
                .package
                .clone()
                .zip(manager)
                .map(|(id, pm)| PackageResource::new(id, pm, executor));
            ToolResource::new(p.command.clone(), package, executor)
        });
        process_resources(ctx, resources, &ProcessOpts::install_missing("install"))
    }
}
