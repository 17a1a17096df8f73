//! Turns command-line flags or menu answers into a [`RunConfiguration`].
//!
//! Any `--skip-*` flag or `--dry-run` on the command line bypasses the menu,
//! as does `--no-menu`.
pub mod menu;

use std::collections::BTreeSet;

pub use menu::{MenuChoice, Prompter, StdioPrompter, run_menu};

use crate::dry_run::DryRun;
use crate::logging::Log;
use crate::modules::registry::{MASTER, ModuleId, Toggle};

/// Which modules run, and whether the run is a preview. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    dry_run: DryRun,
    excluded: BTreeSet<Toggle>,
    selected: BTreeSet<ModuleId>,
}

impl RunConfiguration {
    /// Build a configuration excluding `excluded`.
    ///
    /// Modules without a toggle are always selected.
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use provision_cli::dry_run::DryRun;
    /// use provision_cli::modules::registry::{ModuleId, Toggle};
    /// use provision_cli::selection::RunConfiguration;
    ///
    /// let config = RunConfiguration::new(DryRun::new(false), BTreeSet::from([Toggle::Drivers]));
    /// assert!(!config.is_selected(ModuleId::HardwareDetect));
    /// assert!(!config.is_selected(ModuleId::DriverInstall));
    /// assert!(config.is_selected(ModuleId::Fonts));
    /// ```
    #[must_use]
    pub fn new(dry_run: DryRun, excluded: BTreeSet<Toggle>) -> Self {
        let selected = MASTER
            .iter()
            .filter(|d| d.toggle.is_none_or(|t| !excluded.contains(&t)))
            .map(|d| d.id)
            .collect();
        Self {
            dry_run,
            excluded,
            selected,
        }
    }

    /// Preview flag.
    #[must_use]
    pub const fn dry_run(&self) -> DryRun {
        self.dry_run
    }

    /// Excluded toggles.
    #[must_use]
    pub const fn excluded(&self) -> &BTreeSet<Toggle> {
        &self.excluded
    }

    /// Selected module ids.
    #[must_use]
    pub const fn selected(&self) -> &BTreeSet<ModuleId> {
        &self.selected
    }

    /// Whether `id` runs.
    #[must_use]
    pub fn is_selected(&self, id: ModuleId) -> bool {
        self.selected.contains(&id)
    }

    /// Arguments that reproduce this configuration in a relaunched process.
    ///
    /// The menu is suppressed so the elevated process does not ask again.
    /// Dry-run is never relaunched, so it is not encoded.
    #[must_use]
    pub fn relaunch_args(&self) -> Vec<String> {
        Toggle::ALL
            .iter()
            .filter(|t| self.excluded.contains(t))
            .map(|t| t.flag().to_string())
            .chain(std::iter::once("--no-menu".to_string()))
            .collect()
    }
}

/// Selection-related command-line input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionInput {
    /// Toggles named by `--skip-*` flags.
    pub skips: BTreeSet<Toggle>,
    /// `--dry-run` was passed.
    pub dry_run_flag: bool,
    /// `--no-menu` was passed.
    pub no_menu: bool,
}

impl SelectionInput {
    /// `true` when the menu should be shown.
    #[must_use]
    pub fn wants_menu(&self) -> bool {
        !self.no_menu && !self.dry_run_flag && self.skips.is_empty()
    }
}

/// Resolve the run configuration.
///
/// `dry_run` is the flag already established from the command line and the
/// environment; the menu can turn it on but never off. Returns `None` when
/// the user quits or input ends.
pub fn resolve(
    input: &SelectionInput,
    dry_run: DryRun,
    prompter: &mut dyn Prompter,
    log: &dyn Log,
) -> Option<RunConfiguration> {
    if !input.wants_menu() {
        log.debug("selection from command line");
        return Some(RunConfiguration::new(dry_run, input.skips.clone()));
    }
    let choice = run_menu(prompter, log)?;
    let dry_run = DryRun::new(dry_run.is_active() || choice.dry_run);
    Some(RunConfiguration::new(dry_run, choice.excluded))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::menu::test_helpers::ScriptedPrompter;
    use super::*;
    use crate::logging::MemoryLog;

    fn flags(skips: &[Toggle], dry_run_flag: bool, no_menu: bool) -> SelectionInput {
        SelectionInput {
            skips: skips.iter().copied().collect(),
            dry_run_flag,
            no_menu,
        }
    }

    #[test]
    fn non_skippable_always_selected() {
        let config = RunConfiguration::new(DryRun::default(), Toggle::ALL.into_iter().collect());
        let selected: Vec<ModuleId> = config.selected().iter().copied().collect();
        assert_eq!(
            selected,
            vec![ModuleId::Prerequisites, ModuleId::PackageManager, ModuleId::Fonts]
        );
    }

    #[test]
    fn skip_flag_bypasses_menu() {
        let mut prompter = ScriptedPrompter::new(&["q"]);
        let config = resolve(
            &flags(&[Toggle::Wsl], false, false),
            DryRun::default(),
            &mut prompter,
            &MemoryLog::new(),
        )
        .unwrap();
        assert!(prompter.shown.is_empty());
        assert!(!config.is_selected(ModuleId::Wsl));
        assert_eq!(config.selected().len(), 11);
    }

    #[test]
    fn dry_run_flag_bypasses_menu() {
        let mut prompter = ScriptedPrompter::new(&[]);
        let config = resolve(
            &flags(&[], true, false),
            DryRun::new(true),
            &mut prompter,
            &MemoryLog::new(),
        )
        .unwrap();
        assert!(prompter.shown.is_empty());
        assert!(config.dry_run().is_active());
        assert_eq!(config.selected().len(), MASTER.len());
    }

    #[test]
    fn menu_used_without_flags() {
        let mut prompter = ScriptedPrompter::new(&["4"]);
        let config = resolve(
            &SelectionInput::default(),
            DryRun::default(),
            &mut prompter,
            &MemoryLog::new(),
        )
        .unwrap();
        assert!(!prompter.shown.is_empty());
        for id in [ModuleId::HardwareDetect, ModuleId::DriverInstall, ModuleId::Wsl] {
            assert!(!config.is_selected(id));
        }
    }

    #[test]
    fn inherited_dry_run_survives_menu() {
        let config = resolve(
            &SelectionInput::default(),
            DryRun::new(true),
            &mut ScriptedPrompter::new(&["1"]),
            &MemoryLog::new(),
        )
        .unwrap();
        assert!(config.dry_run().is_active());
    }

    #[test]
    fn menu_quit_is_none() {
        assert!(resolve(
            &SelectionInput::default(),
            DryRun::default(),
            &mut ScriptedPrompter::new(&["q"]),
            &MemoryLog::new(),
        )
        .is_none());
    }

    #[test]
    fn relaunch_args_are_lossless() {
        let presets: [&[&str]; 3] = [&["1"], &["4"], &["3", "1", "3", "7", "s"]];
        for preset in presets {
            let config = resolve(
                &SelectionInput::default(),
                DryRun::default(),
                &mut ScriptedPrompter::new(preset),
                &MemoryLog::new(),
            )
            .unwrap();
            let args = config.relaunch_args();
            assert_eq!(args.last().map(String::as_str), Some("--no-menu"));
            let skips: BTreeSet<Toggle> = Toggle::ALL
                .into_iter()
                .filter(|t| args.iter().any(|a| a == t.flag()))
                .collect();
            assert_eq!(
                RunConfiguration::new(DryRun::default(), skips),
                config,
                "{preset:?}"
            );
        }
    }
}
