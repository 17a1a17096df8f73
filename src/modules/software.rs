//! Software manifest installation.
use anyhow::Result;

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome, ProcessOpts, process_resource_states};
use crate::resources::package::{PackageResource, installed_packages};

/// Install every package in the software manifest that is not yet present.
///
/// The installed set is queried once up front; a package that fails to
/// install is reported and counted as skipped so the rest of the manifest
/// still goes through.
#[derive(Debug)]
pub struct InstallSoftware;

impl Module for InstallSoftware {
    fn id(&self) -> ModuleId {
        ModuleId::SoftwareInstall
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let categories = &ctx.config.software;
        if categories.iter().all(|c| c.packages.is_empty()) {
            return Ok(Outcome::Skipped("software manifest is empty".to_string()));
        }
        let Some(manager) = ctx.platform.package_manager else {
            return Ok(Outcome::Skipped("no package manager available".to_string()));
        };

        let executor = ctx.executor.as_ref();
        let installed = &installed_packages(manager, executor, &*ctx.log)?;
        ctx.log
            .debug(&format!("{} packages already installed", installed.len()));

        let resource_states = categories.iter().flat_map(|category| {
            ctx.log.debug(&format!(
                "{}: {} packages",
                category.name,
                category.packages.len()
            ));
            category.packages.iter().map(move |pkg| {
                let resource = PackageResource::new(pkg.id.clone(), manager, executor)
                    .with_source(pkg.source.clone());
                let state = resource.state_from_installed(installed);
                (resource, state)
            })
        });
        process_resource_states(ctx, resource_states, &ProcessOpts::install_missing("install"))
    }
}
