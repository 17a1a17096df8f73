//! Developer font installation.
use anyhow::Result;

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome, ProcessOpts, process_resource_states};
use crate::resources::font::{FontResource, installed_fonts};

/// Install the terminal fonts listed in `fonts.toml`.
///
/// The font listing is read once; families already present are matched
/// case-insensitively against it.
#[derive(Debug)]
pub struct InstallFonts;

impl Module for InstallFonts {
    fn id(&self) -> ModuleId {
        ModuleId::Fonts
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let fonts = &ctx.config.fonts;
        if fonts.is_empty() {
            return Ok(Outcome::Skipped("no fonts configured".to_string()));
        }
        let Some(manager) = ctx.platform.package_manager else {
            return Ok(Outcome::Skipped("no package manager available".to_string()));
        };

        let executor = ctx.executor.as_ref();
        let listing = installed_fonts(ctx.platform.os, executor)?;
        let resource_states = fonts.iter().map(|font| {
            let resource =
                FontResource::new(font.family.clone(), font.package.clone(), manager, executor);
            let state = resource.state_from_listing(&listing);
            (resource, state)
        });
        process_resource_states(ctx, resource_states, &ProcessOpts::install_missing("install"))
    }
}
