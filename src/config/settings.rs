//! Orchestrator settings from `provision.toml`.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::modules::registry::ModuleId;
use crate::platform::Os;

/// Default features enabled by the WSL module.
pub const DEFAULT_WSL_FEATURES: [&str; 2] =
    ["Microsoft-Windows-Subsystem-Linux", "VirtualMachinePlatform"];

/// A tool that must exist before anything else runs.
#[derive(Debug, Clone, Deserialize)]
pub struct Prerequisite {
    /// Executable looked up on `PATH`.
    pub command: String,
    /// Package that provides it.
    pub package: Option<String>,
    /// Restrict to one OS.
    pub os: Option<Os>,
}

/// WSL module settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WslSettings {
    /// Optional features to enable; empty means [`DEFAULT_WSL_FEATURES`].
    pub features: Vec<String>,
    /// Distribution installed after the features are enabled.
    pub distribution: Option<String>,
}

impl WslSettings {
    /// Features to enable.
    #[must_use]
    pub fn features(&self) -> Vec<String> {
        if self.features.is_empty() {
            DEFAULT_WSL_FEATURES.iter().map(|s| (*s).to_string()).collect()
        } else {
            self.features.clone()
        }
    }
}

/// Contents of `provision.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvisionSettings {
    /// Where hand-off artifacts are written (relative paths are under the root).
    pub artifacts_dir: Option<PathBuf>,
    /// Tools required by later modules.
    pub prerequisites: Vec<Prerequisite>,
    /// Modules whose entry point is an external script instead of the
    /// built-in implementation.
    pub scripts: BTreeMap<ModuleId, PathBuf>,
    /// WSL module settings.
    pub wsl: WslSettings,
}

impl ProvisionSettings {
    /// Resolve the artifact directory against `root`.
    #[must_use]
    pub fn artifacts_dir(&self, root: &Path) -> PathBuf {
        match &self.artifacts_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.join("artifacts"),
        }
    }

    /// Resolve a script path against `root`.
    #[must_use]
    pub fn script_path(root: &Path, script: &Path) -> PathBuf {
        if script.is_absolute() {
            script.to_path_buf()
        } else {
            root.join(script)
        }
    }
}
