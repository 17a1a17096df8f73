//! Module descriptors, the fixed master ordering and the entry-point registry.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Module;
use crate::config::settings::ProvisionSettings;
use crate::error::ResolutionError;

/// Stable module identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleId {
    /// Tools every later module relies on.
    Prerequisites,
    /// Package manager bootstrap and source refresh.
    PackageManager,
    /// Software manifest installation.
    SoftwareInstall,
    /// System preference tweaks.
    SystemConfig,
    /// Telemetry opt-out.
    Telemetry,
    /// User environment variables.
    Environment,
    /// Source-control identity.
    GitConfig,
    /// Terminal fonts.
    Fonts,
    /// Shell profile block.
    ShellProfile,
    /// Hardware inventory and artifact export.
    HardwareDetect,
    /// Vendor driver installation.
    DriverInstall,
    /// Linux compatibility layer.
    Wsl,
}

impl ModuleId {
    /// Kebab-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prerequisites => "prerequisites",
            Self::PackageManager => "package-manager",
            Self::SoftwareInstall => "software-install",
            Self::SystemConfig => "system-config",
            Self::Telemetry => "telemetry",
            Self::Environment => "environment",
            Self::GitConfig => "git-config",
            Self::Fonts => "fonts",
            Self::ShellProfile => "shell-profile",
            Self::HardwareDetect => "hardware-detect",
            Self::DriverInstall => "driver-install",
            Self::Wsl => "wsl",
        }
    }

    /// Label shown in logs and the report.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Prerequisites => "Install prerequisites",
            Self::PackageManager => "Bootstrap package manager",
            Self::SoftwareInstall => "Install software",
            Self::SystemConfig => "Configure system preferences",
            Self::Telemetry => "Disable telemetry",
            Self::Environment => "Configure environment variables",
            Self::GitConfig => "Configure git identity",
            Self::Fonts => "Install terminal fonts",
            Self::ShellProfile => "Configure shell profile",
            Self::HardwareDetect => "Detect hardware",
            Self::DriverInstall => "Install drivers",
            Self::Wsl => "Enable WSL",
        }
    }

    /// Toggle that excludes this module; `None` for foundational modules.
    #[must_use]
    pub const fn toggle(self) -> Option<Toggle> {
        match self {
            Self::Prerequisites | Self::PackageManager | Self::Fonts => None,
            Self::SoftwareInstall => Some(Toggle::Software),
            Self::SystemConfig => Some(Toggle::SystemConfig),
            Self::Telemetry => Some(Toggle::Telemetry),
            Self::Environment => Some(Toggle::Environment),
            Self::GitConfig => Some(Toggle::GitConfig),
            Self::ShellProfile => Some(Toggle::PowerShell),
            Self::HardwareDetect | Self::DriverInstall => Some(Toggle::Drivers),
            Self::Wsl => Some(Toggle::Wsl),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing exclusion switch (CLI `--skip-*` flag or checklist entry).
///
/// One toggle may cover several modules: [`Toggle::Drivers`] excludes both
/// hardware detection and driver installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Toggle {
    /// `--skip-software`
    Software,
    /// `--skip-system-config`
    SystemConfig,
    /// `--skip-environment`
    Environment,
    /// `--skip-drivers`
    Drivers,
    /// `--skip-wsl`
    Wsl,
    /// `--skip-telemetry`
    Telemetry,
    /// `--skip-powershell`
    PowerShell,
    /// `--skip-git-config`
    GitConfig,
}

impl Toggle {
    /// Every toggle, in checklist order.
    pub const ALL: [Self; 8] = [
        Self::Software,
        Self::SystemConfig,
        Self::Environment,
        Self::Drivers,
        Self::Wsl,
        Self::Telemetry,
        Self::PowerShell,
        Self::GitConfig,
    ];

    /// Command-line flag that sets this toggle.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Software => "--skip-software",
            Self::SystemConfig => "--skip-system-config",
            Self::Environment => "--skip-environment",
            Self::Drivers => "--skip-drivers",
            Self::Wsl => "--skip-wsl",
            Self::Telemetry => "--skip-telemetry",
            Self::PowerShell => "--skip-powershell",
            Self::GitConfig => "--skip-git-config",
        }
    }

    /// Checklist label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Software => "Software installation",
            Self::SystemConfig => "System preferences",
            Self::Environment => "Environment variables",
            Self::Drivers => "Hardware detection and drivers",
            Self::Wsl => "WSL",
            Self::Telemetry => "Telemetry opt-out",
            Self::PowerShell => "Shell profile",
            Self::GitConfig => "Git identity",
        }
    }
}

/// Static metadata for one provisioning unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Stable identifier.
    pub id: ModuleId,
    /// Label shown in logs.
    pub display_name: &'static str,
    /// Position in the master sequence; ties keep declaration order.
    pub order: u16,
    /// Exclusion switch, `None` when the module always runs.
    pub toggle: Option<Toggle>,
}

impl ModuleDescriptor {
    const fn new(id: ModuleId, order: u16) -> Self {
        Self {
            id,
            display_name: id.display_name(),
            order,
            toggle: id.toggle(),
        }
    }

    /// Whether selection may exclude this module.
    #[must_use]
    pub const fn skippable(&self) -> bool {
        self.toggle.is_some()
    }
}

/// The master table, in declaration order.
pub const MASTER: [ModuleDescriptor; 12] = [
    ModuleDescriptor::new(ModuleId::Prerequisites, 10),
    ModuleDescriptor::new(ModuleId::PackageManager, 20),
    ModuleDescriptor::new(ModuleId::SoftwareInstall, 30),
    ModuleDescriptor::new(ModuleId::SystemConfig, 40),
    ModuleDescriptor::new(ModuleId::Telemetry, 50),
    ModuleDescriptor::new(ModuleId::Environment, 60),
    ModuleDescriptor::new(ModuleId::GitConfig, 70),
    ModuleDescriptor::new(ModuleId::Fonts, 80),
    ModuleDescriptor::new(ModuleId::ShellProfile, 90),
    ModuleDescriptor::new(ModuleId::HardwareDetect, 100),
    ModuleDescriptor::new(ModuleId::DriverInstall, 101),
    ModuleDescriptor::new(ModuleId::Wsl, 110),
];

/// Descriptors in execution order.
///
/// Sorting is stable, so descriptors sharing an `order` value run in the
/// order they are declared in [`MASTER`].
#[must_use]
pub fn descriptors() -> Vec<&'static ModuleDescriptor> {
    let mut all: Vec<&'static ModuleDescriptor> = MASTER.iter().collect();
    all.sort_by_key(|d| d.order);
    all
}

/// Entry points by module id.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<ModuleId, Box<dyn Module>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.entries.keys().collect();
        ids.sort();
        f.debug_struct("Registry").field("entries", &ids).finish()
    }
}

impl Registry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the entry point for `module.id()`.
    pub fn insert(&mut self, module: Box<dyn Module>) {
        self.entries.insert(module.id(), module);
    }

    /// Registry holding the built-in implementation of every module.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let modules: [Box<dyn Module>; 12] = [
            Box::new(super::prerequisites::InstallPrerequisites),
            Box::new(super::package_manager::BootstrapPackageManager),
            Box::new(super::software::InstallSoftware),
            Box::new(super::system_config::ConfigureSystem),
            Box::new(super::telemetry::DisableTelemetry),
            Box::new(super::environment::ConfigureEnvironment),
            Box::new(super::git_config::ConfigureGitIdentity),
            Box::new(super::fonts::InstallFonts),
            Box::new(super::shell_profile::ConfigureShellProfile),
            Box::new(super::hardware::DetectHardware),
            Box::new(super::drivers::InstallDrivers),
            Box::new(super::wsl::EnableWsl),
        ];
        for module in modules {
            registry.insert(module);
        }
        registry
    }

    /// Replace built-ins with the script entry points configured in
    /// `provision.toml`.
    #[must_use]
    pub fn with_overrides(mut self, scripts: &BTreeMap<ModuleId, PathBuf>, root: &Path) -> Self {
        for (id, script) in scripts {
            let path = ProvisionSettings::script_path(root, script);
            self.insert(Box::new(super::script::ScriptModule::new(*id, path)));
        }
        self
    }

    /// Look up the entry point for `id` and check it can be invoked.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NotRegistered`] when nothing is registered,
    /// or the module's own resolution error.
    pub fn resolve(&self, id: ModuleId) -> Result<&dyn Module, ResolutionError> {
        let module = self
            .entries
            .get(&id)
            .ok_or(ResolutionError::NotRegistered(id))?;
        module.resolve()?;
        Ok(module.as_ref())
    }

    /// Resolve every id, returning the failures.
    #[must_use]
    pub fn validate(&self, ids: impl IntoIterator<Item = ModuleId>) -> Vec<ResolutionError> {
        ids.into_iter()
            .filter_map(|id| self.resolve(id).err())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::modules::{Context, Handoff, Outcome};

    struct Stub(ModuleId);

    impl Module for Stub {
        fn id(&self) -> ModuleId {
            self.0
        }

        fn execute(&self, _: &Context, _: &mut Handoff) -> anyhow::Result<Outcome> {
            Ok(Outcome::Ok)
        }
    }

    #[test]
    fn master_order_is_fixed() {
        let ids: Vec<ModuleId> = descriptors().iter().map(|d| d.id).collect();
        let declared: Vec<ModuleId> = MASTER.iter().map(|d| d.id).collect();
        assert_eq!(ids, declared);
        assert_eq!(ids.first(), Some(&ModuleId::Prerequisites));
        assert_eq!(ids.last(), Some(&ModuleId::Wsl));
    }

    #[test]
    fn orders_are_strictly_increasing_in_declaration() {
        assert!(MASTER.windows(2).all(|w| w[0].order < w[1].order));
    }

    #[test]
    fn stable_sort_keeps_declaration_order_for_ties() {
        let mut table = vec![
            ModuleDescriptor::new(ModuleId::DriverInstall, 100),
            ModuleDescriptor::new(ModuleId::HardwareDetect, 100),
        ];
        table.sort_by_key(|d| d.order);
        assert_eq!(table[0].id, ModuleId::DriverInstall);
    }

    #[test]
    fn non_skippable_modules() {
        let fixed: Vec<ModuleId> = MASTER
            .iter()
            .filter(|d| !d.skippable())
            .map(|d| d.id)
            .collect();
        assert_eq!(
            fixed,
            vec![ModuleId::Prerequisites, ModuleId::PackageManager, ModuleId::Fonts]
        );
    }

    #[test]
    fn drivers_toggle_covers_detection_pair() {
        let covered: Vec<ModuleId> = MASTER
            .iter()
            .filter(|d| d.toggle == Some(Toggle::Drivers))
            .map(|d| d.id)
            .collect();
        assert_eq!(
            covered,
            vec![ModuleId::HardwareDetect, ModuleId::DriverInstall]
        );
    }

    #[test]
    fn every_toggle_covers_a_module() {
        for toggle in Toggle::ALL {
            assert!(MASTER.iter().any(|d| d.toggle == Some(toggle)), "{toggle:?}");
        }
    }

    #[test]
    fn ids_serialize_kebab_case() {
        for d in MASTER {
            let json = serde_json::to_string(&d.id).unwrap();
            assert_eq!(json, format!("\"{}\"", d.id));
        }
    }

    #[test]
    fn builtin_registry_resolves_everything() {
        let registry = Registry::builtin();
        assert!(registry.validate(MASTER.iter().map(|d| d.id)).is_empty());
        assert_eq!(
            registry.resolve(ModuleId::Wsl).unwrap().name(),
            "Enable WSL"
        );
    }

    #[test]
    fn missing_entry_is_not_registered() {
        let mut registry = Registry::new();
        registry.insert(Box::new(Stub(ModuleId::Fonts)));
        let errors = registry.validate([ModuleId::Fonts, ModuleId::Wsl]);
        assert_eq!(errors, vec![ResolutionError::NotRegistered(ModuleId::Wsl)]);
    }

    #[test]
    fn script_override_with_missing_file_fails_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        let mut scripts = BTreeMap::new();
        scripts.insert(ModuleId::Wsl, PathBuf::from("scripts/wsl.ps1"));
        let registry = Registry::builtin().with_overrides(&scripts, tmp.path());
        let err = registry.resolve(ModuleId::Wsl).err().unwrap();
        assert!(matches!(err, ResolutionError::ScriptMissing { .. }));
    }
}
