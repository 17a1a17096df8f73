//! Preference sections shared by `system.toml` and `telemetry.toml`.
//!
//! Each section targets one registry key (`path`, Windows) or one
//! `gsettings` schema (`schema`, Linux) and lists the values to set:
//!
//! ```toml
//! [explorer]
//! path = 'HKCU:\Software\Microsoft\Windows\CurrentVersion\Explorer\Advanced'
//! values = { HideFileExt = 0, Hidden = 1 }
//!
//! [interface]
//! schema = "org.gnome.desktop.interface"
//! values = { clock-show-seconds = true }
//! ```
use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::platform::{Os, Platform};
use crate::resources::preference::PreferenceStore;

/// One resolved preference value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceEntry {
    /// Section name, used in log messages.
    pub section: String,
    /// Backing store.
    pub store: PreferenceStore,
    /// Value name.
    pub name: String,
    /// Desired value as a string.
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct PreferenceSection {
    path: Option<String>,
    schema: Option<String>,
    #[serde(default)]
    values: BTreeMap<String, toml::Value>,
}

/// Flatten sections into entries for `platform`.
///
/// Registry sections only apply on Windows and schema sections only on
/// Linux. A section naming both or neither store is rejected.
pub(super) fn resolve(
    file: &Path,
    sections: BTreeMap<String, PreferenceSection>,
    platform: &Platform,
) -> Result<Vec<PreferenceEntry>, ConfigError> {
    let mut entries = Vec::new();
    for (section, body) in sections {
        let (store, os) = match (body.path, body.schema) {
            (Some(path), None) => (PreferenceStore::Registry(path), Os::Windows),
            (None, Some(schema)) => (PreferenceStore::GSettings(schema), Os::Linux),
            _ => {
                return Err(ConfigError::InvalidSyntax {
                    path: file.to_path_buf(),
                    message: format!("section [{section}] needs exactly one of `path` or `schema`"),
                });
            }
        };
        if os != platform.os {
            continue;
        }
        entries.extend(body.values.into_iter().map(|(name, value)| PreferenceEntry {
            section: section.clone(),
            store: store.clone(),
            name,
            value: value_to_string(&value, os),
        }));
    }
    Ok(entries)
}

/// Convert a TOML value to its string form for the target store.
fn value_to_string(value: &toml::Value, os: Os) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => match os {
            Os::Windows => if *b { "1" } else { "0" }.to_string(),
            Os::Linux => b.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::test_helpers::write_temp_toml;
    use crate::config::toml_loader::load_config;

    const SYSTEM: &str = r#"
[explorer]
path = 'HKCU:\Software\Microsoft\Windows\CurrentVersion\Explorer\Advanced'
values = { HideFileExt = 0, ShowTaskViewButton = false }

[interface]
schema = "org.gnome.desktop.interface"
values = { clock-show-seconds = true, color-scheme = "prefer-dark" }
"#;

    fn load(os: Os) -> Vec<PreferenceEntry> {
        let (_dir, path) = write_temp_toml(SYSTEM);
        let sections = load_config(&path).unwrap();
        resolve(&path, sections, &Platform::new(os, None)).unwrap()
    }

    #[test]
    fn windows_gets_registry_values() {
        let entries = load(Os::Windows);
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0].store, PreferenceStore::Registry(_)));
        assert_eq!(entries[0].name, "HideFileExt");
        assert_eq!(entries[1].value, "0");
    }

    #[test]
    fn linux_gets_gsettings_values() {
        let entries = load(Os::Linux);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "clock-show-seconds");
        assert_eq!(entries[0].value, "true");
        assert_eq!(entries[1].value, "prefer-dark");
    }

    #[test]
    fn ambiguous_section_rejected() {
        let (_dir, path) = write_temp_toml("[bad]\nvalues = { a = 1 }\n");
        let sections = load_config(&path).unwrap();
        let err = resolve(&path, sections, &Platform::new(Os::Linux, None)).unwrap_err();
        assert!(err.to_string().contains("[bad]"));
    }
}
