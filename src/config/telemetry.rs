//! Telemetry opt-out settings (`telemetry.toml`).
use std::collections::BTreeMap;

use serde::Deserialize;

use super::environment::EnvVar;
use super::preferences::{PreferenceEntry, PreferenceSection};
use crate::platform::Os;

/// A data-collection service to stop and disable.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServiceEntry {
    /// Service name.
    pub name: String,
    /// Restrict to one OS.
    pub os: Option<Os>,
}

/// Resolved telemetry configuration for the current platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Policy values (registry or gsettings).
    pub preferences: Vec<PreferenceEntry>,
    /// Services to disable.
    pub services: Vec<ServiceEntry>,
    /// Opt-out environment variables (`DOTNET_CLI_TELEMETRY_OPTOUT`, …).
    pub variables: Vec<EnvVar>,
}

impl TelemetryConfig {
    /// `true` when nothing is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty() && self.services.is_empty() && self.variables.is_empty()
    }
}

/// Contents of `telemetry.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct TelemetryFile {
    pub(super) preferences: BTreeMap<String, PreferenceSection>,
    pub(super) services: Vec<ServiceEntry>,
    pub(super) variables: Vec<EnvVar>,
}
