//! Shell profile block (`shell.toml`), one section per OS.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::platform::Os;

/// Profile settings for one OS.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShellConfig {
    /// Profile script; relative paths are under the home directory.
    pub profile: Option<PathBuf>,
    /// Lines kept in the managed block.
    pub lines: Vec<String>,
}

impl ShellConfig {
    /// Default profile path for `os`, relative to home.
    #[must_use]
    pub fn default_profile(os: Os) -> PathBuf {
        match os {
            Os::Windows => ["Documents", "PowerShell", "Microsoft.PowerShell_profile.ps1"]
                .iter()
                .collect(),
            Os::Linux => PathBuf::from(".bashrc"),
        }
    }

    /// Resolve the profile path against `home`.
    #[must_use]
    pub fn profile_path(&self, os: Os, home: &Path) -> PathBuf {
        let profile = self
            .profile
            .clone()
            .unwrap_or_else(|| Self::default_profile(os));
        if profile.is_absolute() {
            profile
        } else {
            home.join(profile)
        }
    }
}

/// Contents of `shell.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ShellFile {
    pub(super) windows: ShellConfig,
    pub(super) linux: ShellConfig,
}

impl ShellFile {
    /// Section for `os`.
    pub(super) fn for_os(self, os: Os) -> ShellConfig {
        match os {
            Os::Windows => self.windows,
            Os::Linux => self.linux,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::test_helpers::write_temp_toml;
    use crate::config::toml_loader::load_config;

    #[test]
    fn picks_section_for_os() {
        let (_dir, path) = write_temp_toml(
            r#"
[windows]
lines = ["Set-PSReadLineOption -EditMode Emacs"]

[linux]
profile = ".config/bash/provision.sh"
lines = ["export HISTSIZE=10000"]
"#,
        );
        let file: ShellFile = load_config(&path).unwrap();
        let linux = file.for_os(Os::Linux);
        assert_eq!(linux.lines, vec!["export HISTSIZE=10000"]);
        assert_eq!(
            linux.profile_path(Os::Linux, Path::new("/home/dev")),
            PathBuf::from("/home/dev/.config/bash/provision.sh")
        );
    }

    #[test]
    fn default_profiles() {
        let cfg = ShellConfig::default();
        assert_eq!(
            cfg.profile_path(Os::Linux, Path::new("/home/dev")),
            PathBuf::from("/home/dev/.bashrc")
        );
        assert!(
            cfg.profile_path(Os::Windows, Path::new("/home/dev"))
                .ends_with("Microsoft.PowerShell_profile.ps1")
        );
    }
}
