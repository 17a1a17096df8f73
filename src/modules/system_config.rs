//! System preference tweaks.
use anyhow::Result;

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome, ProcessOpts, process_resources};
use crate::config::preferences::PreferenceEntry;
use crate::exec::Executor;
use crate::resources::preference::PreferenceResource;

/// Apply the system preference tweaks from `system.toml`.
#[derive(Debug)]
pub struct ConfigureSystem;

impl Module for ConfigureSystem {
    fn id(&self) -> ModuleId {
        ModuleId::SystemConfig
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let entries = &ctx.config.preferences;
        if entries.is_empty() {
            return Ok(Outcome::Skipped(
                "no preferences for this platform".to_string(),
            ));
        }
        process_resources(
            ctx,
            preference_resources(entries, ctx.executor.as_ref()),
            &ProcessOpts::apply_all("set"),
        )
    }
}

/// Build one resource per configured preference value.
pub(super) fn preference_resources<'a>(
    entries: &'a [PreferenceEntry],
    executor: &'a dyn Executor,
) -> impl Iterator<Item = PreferenceResource<'a>> + 'a {
    entries.iter().map(move |entry| {
        PreferenceResource::new(
            entry.store.clone(),
            entry.name.clone(),
            entry.value.clone(),
            executor,
        )
    })
}
