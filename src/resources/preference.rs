//! System preference resource: Windows registry values and GNOME settings.
use anyhow::{Context as _, Result};

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// Printed by the registry probe when the value does not exist.
const NOT_FOUND: &str = "::NOT_FOUND::";

/// Where a preference lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceStore {
    /// Windows registry key path (e.g. `HKCU:\Console`).
    Registry(String),
    /// `gsettings` schema (e.g. `org.gnome.desktop.interface`).
    GSettings(String),
}

/// A single preference value that can be checked and applied.
#[derive(Debug)]
pub struct PreferenceResource<'a> {
    /// Backing store and key path.
    pub store: PreferenceStore,
    /// Value name within the key or schema.
    pub name: String,
    /// Desired value (as string).
    pub value: String,
    executor: &'a dyn Executor,
}

impl<'a> PreferenceResource<'a> {
    /// Create a new preference resource.
    #[must_use]
    pub const fn new(
        store: PreferenceStore,
        name: String,
        value: String,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            store,
            name,
            value,
            executor,
        }
    }

    fn read_registry(&self, key_path: &str) -> Result<Option<String>> {
        let key = key_path.replace('\'', "''");
        let name = self.name.replace('\'', "''");
        let script = format!(
            "$ErrorActionPreference='SilentlyContinue'\n\
             $v = (Get-ItemProperty -Path '{key}' -Name '{name}' -ErrorAction SilentlyContinue).'{name}'\n\
             if ($null -eq $v) {{ Write-Output '{NOT_FOUND}' }} else {{ Write-Output $v }}"
        );
        let result = self
            .executor
            .run_unchecked("powershell", &["-NoProfile", "-Command", &script])?;
        let output = result.stdout.trim();
        if !result.success || output == NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(output.to_string()))
    }

    fn read_gsettings(&self, schema: &str) -> Result<Option<String>> {
        let result = self
            .executor
            .run_unchecked("gsettings", &["get", schema, &self.name])?;
        if !result.success {
            return Ok(None);
        }
        Ok(Some(unquote(result.stdout.trim()).to_string()))
    }
}

impl Resource for PreferenceResource<'_> {
    fn description(&self) -> String {
        match &self.store {
            PreferenceStore::Registry(path) => format!("{path}\\{} = {}", self.name, self.value),
            PreferenceStore::GSettings(schema) => {
                format!("{schema} {} = {}", self.name, self.value)
            }
        }
    }

    fn current_state(&self) -> Result<ResourceState> {
        let current = match &self.store {
            PreferenceStore::Registry(path) => self.read_registry(path)?,
            PreferenceStore::GSettings(schema) => {
                if !self.executor.which("gsettings") {
                    return Ok(ResourceState::Invalid {
                        reason: "gsettings not available".to_string(),
                    });
                }
                self.read_gsettings(schema)?
            }
        };
        Ok(current.map_or(ResourceState::Missing, |current| {
            if value_matches(&current, &self.value) {
                ResourceState::Correct
            } else {
                ResourceState::Incorrect { current }
            }
        }))
    }

    fn apply(&self) -> Result<ResourceChange> {
        match &self.store {
            PreferenceStore::Registry(path) => {
                let key = path.replace('\'', "''");
                let name = self.name.replace('\'', "''");
                let (ps_value, ps_type) = format_registry_value(&self.value);
                let script = format!(
                    "if (!(Test-Path '{key}')) {{ New-Item -Path '{key}' -Force | Out-Null }}\n\
                     Set-ItemProperty -Path '{key}' -Name '{name}' -Value {ps_value} -Type {ps_type}"
                );
                self.executor
                    .run("powershell", &["-NoProfile", "-Command", &script])
                    .with_context(|| format!("set registry: {path}\\{}", self.name))?;
            }
            PreferenceStore::GSettings(schema) => {
                self.executor
                    .run("gsettings", &["set", schema, &self.name, &self.value])
                    .with_context(|| format!("gsettings set {schema} {}", self.name))?;
            }
        }
        Ok(ResourceChange::Applied)
    }
}

/// Strip the single quotes `gsettings get` puts around string values.
fn unquote(s: &str) -> &str {
    s.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(s)
}

/// Compare preference values, handling numeric values specially.
fn value_matches(current: &str, expected: &str) -> bool {
    if let Some(hex) = expected
        .strip_prefix("0x")
        .or_else(|| expected.strip_prefix("0X"))
        && let Ok(expected_num) = u64::from_str_radix(hex, 16)
    {
        return current.parse::<u64>().ok() == Some(expected_num);
    }

    if let Ok(expected_num) = expected.parse::<i64>() {
        return current.parse::<i64>().ok() == Some(expected_num);
    }

    unquote(current) == unquote(expected)
}

/// Format a value string for `PowerShell` `Set-ItemProperty`.
/// Returns (`value_expression`, `type_name`).
fn format_registry_value(data: &str) -> (String, &'static str) {
    if let Some(hex) = data.strip_prefix("0x").or_else(|| data.strip_prefix("0X"))
        && let Ok(n) = u64::from_str_radix(hex, 16)
    {
        return (n.to_string(), "DWord");
    }

    if data.parse::<i64>().is_ok() {
        return (data.to_string(), "DWord");
    }

    let escaped = data.replace('\'', "''");
    (format!("'{escaped}'"), "String")
}
