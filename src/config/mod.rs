//! Configuration loaded from TOML files under `<root>/conf/`.
//!
//! Every file is optional: a missing file yields empty configuration for
//! the module that reads it. Entries carrying an `os` filter are dropped
//! on other platforms at load time, so modules only ever see what applies.
pub mod drivers;
pub mod environment;
pub mod fonts;
pub mod git_config;
pub mod preferences;
pub mod settings;
pub mod shell;
pub mod software;
pub mod telemetry;
pub mod toml_loader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::platform::Platform;

use self::toml_loader::load_config;

/// All configuration for one run, filtered to the current platform.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Configuration root (parent of `conf/`).
    pub root: PathBuf,
    /// `provision.toml`.
    pub settings: settings::ProvisionSettings,
    /// `software.toml`.
    pub software: Vec<software::SoftwareCategory>,
    /// `system.toml`.
    pub preferences: Vec<preferences::PreferenceEntry>,
    /// `telemetry.toml`.
    pub telemetry: telemetry::TelemetryConfig,
    /// `environment.toml`.
    pub environment: Vec<environment::EnvVar>,
    /// `git.toml`.
    pub git: git_config::GitConfig,
    /// `fonts.toml`.
    pub fonts: Vec<fonts::Font>,
    /// `shell.toml`, section for this OS.
    pub shell: shell::ShellConfig,
    /// `drivers.toml`.
    pub drivers: Vec<drivers::DriverRule>,
}

impl Config {
    /// Empty configuration rooted at `root`.
    #[must_use]
    pub fn empty(root: PathBuf) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    /// Load all configuration from `<root>/conf/`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for the first file that exists but cannot be
    /// read or parsed.
    pub fn load(root: &Path, platform: &Platform) -> Result<Self, ConfigError> {
        let conf = root.join("conf");

        let mut settings: settings::ProvisionSettings = load_config(&conf.join("provision.toml"))?;
        settings
            .prerequisites
            .retain(|p| platform.includes(p.os));

        let software = load_config::<software::SoftwareManifest>(&conf.join("software.toml"))?
            .for_platform(platform);

        let system_path = conf.join("system.toml");
        let sections: BTreeMap<String, preferences::PreferenceSection> =
            load_config(&system_path)?;
        let preferences = preferences::resolve(&system_path, sections, platform)?;

        let telemetry_path = conf.join("telemetry.toml");
        let file: telemetry::TelemetryFile = load_config(&telemetry_path)?;
        let telemetry = telemetry::TelemetryConfig {
            preferences: preferences::resolve(&telemetry_path, file.preferences, platform)?,
            services: file
                .services
                .into_iter()
                .filter(|s| platform.includes(s.os))
                .collect(),
            variables: file
                .variables
                .into_iter()
                .filter(|v| platform.includes(v.os))
                .collect(),
        };

        let environment = load_config::<environment::EnvironmentFile>(&conf.join("environment.toml"))?
            .variables
            .into_iter()
            .filter(|v| platform.includes(v.os))
            .collect();

        let mut git: git_config::GitConfig = load_config(&conf.join("git.toml"))?;
        git.settings.retain(|s| platform.includes(s.os));

        let fonts = load_config::<fonts::FontsFile>(&conf.join("fonts.toml"))?
            .fonts
            .into_iter()
            .filter(|f| platform.includes(f.os))
            .collect();

        let shell = load_config::<shell::ShellFile>(&conf.join("shell.toml"))?.for_os(platform.os);

        let drivers = load_config::<drivers::DriversFile>(&conf.join("drivers.toml"))?
            .drivers
            .into_iter()
            .filter(|d| platform.includes(d.os))
            .collect();

        Ok(Self {
            root: root.to_path_buf(),
            settings,
            software,
            preferences,
            telemetry,
            environment,
            git,
            fonts,
            shell,
            drivers,
        })
    }

    /// Directory holding inter-module artifacts.
    #[must_use]
    pub fn artifacts_dir(&self) -> PathBuf {
        self.settings.artifacts_dir(&self.root)
    }
}

/// Shared helpers for config unit tests.
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub mod test_helpers {
    use std::path::PathBuf;

    /// Write `content` to `test.toml` in a fresh temp dir.
    ///
    /// Keep the returned [`tempfile::TempDir`] alive for as long as the path
    /// is used.
    #[must_use]
    pub fn write_temp_toml(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }
}
