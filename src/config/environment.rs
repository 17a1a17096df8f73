//! User environment variables (`environment.toml`, also used by telemetry opt-outs).
use serde::Deserialize;

use crate::platform::Os;

/// A persistent user environment variable.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Desired value.
    pub value: String,
    /// Restrict to one OS.
    pub os: Option<Os>,
}

/// Contents of `environment.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct EnvironmentFile {
    pub(super) variables: Vec<EnvVar>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::test_helpers::write_temp_toml;
    use crate::config::toml_loader::load_config;

    #[test]
    fn parses_variables() {
        let (_dir, path) = write_temp_toml(
            r#"variables = [
  { name = "EDITOR", value = "nvim", os = "linux" },
  { name = "POWERSHELL_TELEMETRY_OPTOUT", value = "1" },
]
"#,
        );
        let file: EnvironmentFile = load_config(&path).unwrap();
        assert_eq!(file.variables.len(), 2);
        assert_eq!(file.variables[0].os, Some(Os::Linux));
        assert_eq!(file.variables[1].os, None);
    }
}
