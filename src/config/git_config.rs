//! Source-control identity (`git.toml`).
use serde::Deserialize;

use crate::platform::Os;

/// Author identity written to the global git config.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GitIdentity {
    /// `user.name`.
    pub name: String,
    /// `user.email`.
    pub email: String,
}

/// An additional global git setting.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GitSetting {
    /// Config key (e.g. `core.autocrlf`).
    pub key: String,
    /// Desired value.
    pub value: String,
    /// Restrict to one OS.
    pub os: Option<Os>,
}

/// Contents of `git.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    /// Identity; when absent only `settings` are applied.
    pub identity: Option<GitIdentity>,
    /// Extra settings.
    pub settings: Vec<GitSetting>,
}

impl GitConfig {
    /// Every `(key, value)` pair to apply, identity first.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = Vec::with_capacity(self.settings.len() + 2);
        if let Some(id) = &self.identity {
            entries.push(("user.name".to_string(), id.name.clone()));
            entries.push(("user.email".to_string(), id.email.clone()));
        }
        entries.extend(
            self.settings
                .iter()
                .map(|s| (s.key.clone(), s.value.clone())),
        );
        entries
    }
}
