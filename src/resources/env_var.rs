//! User environment variable resource.
//!
//! On Windows variables live in `HKCU\Environment` and are written with
//! `setx`. On Linux they are kept in a systemd `environment.d` drop-in that
//! is read at login.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// Drop-in file (relative to `$HOME`) holding managed Linux variables.
pub const ENVIRONMENT_D_FILE: &str = ".config/environment.d/90-provision.conf";

/// Where the variable is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvTarget {
    /// Per-user Windows environment, via the executor.
    WindowsUser,
    /// `KEY=VALUE` lines in the given file.
    EnvironmentD(PathBuf),
}

impl EnvTarget {
    /// Linux target for the given home directory.
    #[must_use]
    pub fn environment_d(home: &Path) -> Self {
        Self::EnvironmentD(home.join(ENVIRONMENT_D_FILE))
    }
}

/// A persistent user environment variable.
#[derive(Debug)]
pub struct EnvVarResource<'a> {
    /// Variable name.
    pub name: String,
    /// Desired value.
    pub value: String,
    target: EnvTarget,
    executor: &'a dyn Executor,
}

impl<'a> EnvVarResource<'a> {
    /// Create a new environment variable resource.
    #[must_use]
    pub const fn new(
        name: String,
        value: String,
        target: EnvTarget,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            name,
            value,
            target,
            executor,
        }
    }

    fn read_windows(&self) -> Result<Option<String>> {
        let result = self
            .executor
            .run_unchecked("reg", &["query", "HKCU\\Environment", "/v", &self.name])?;
        if !result.success {
            return Ok(None);
        }
        // `    NAME    REG_SZ    value with spaces`
        Ok(result.stdout.lines().find_map(|line| {
            let mut parts = line.trim().splitn(3, "    ");
            let name = parts.next()?;
            let _kind = parts.next()?;
            name.eq_ignore_ascii_case(&self.name)
                .then(|| parts.next().unwrap_or_default().trim().to_string())
        }))
    }

    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(find_assignment(&content, &self.name).map(str::to_string))
    }

    fn write_file(&self, path: &Path) -> Result<()> {
        let content = if path.exists() {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
        } else {
            String::new()
        };
        let updated = upsert_assignment(&content, &self.name, &self.value);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, updated).with_context(|| format!("writing {}", path.display()))
    }
}

impl Resource for EnvVarResource<'_> {
    fn description(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    fn current_state(&self) -> Result<ResourceState> {
        let current = match &self.target {
            EnvTarget::WindowsUser => self.read_windows()?,
            EnvTarget::EnvironmentD(path) => self.read_file(path)?,
        };
        Ok(match current {
            None => ResourceState::Missing,
            Some(v) if v == self.value => ResourceState::Correct,
            Some(current) => ResourceState::Incorrect { current },
        })
    }

    fn apply(&self) -> Result<ResourceChange> {
        match &self.target {
            EnvTarget::WindowsUser => {
                self.executor.run("setx", &[&self.name, &self.value])?;
            }
            EnvTarget::EnvironmentD(path) => self.write_file(path)?,
        }
        Ok(ResourceChange::Applied)
    }
}

/// Find the value assigned to `name` in `KEY=VALUE` content.
fn find_assignment<'c>(content: &'c str, name: &str) -> Option<&'c str> {
    content.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

/// Replace the assignment of `name` or append one.
fn upsert_assignment(content: &str, name: &str, value: &str) -> String {
    let mut found = false;
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| match line.split_once('=') {
            Some((key, _)) if key.trim() == name => {
                found = true;
                format!("{name}={value}")
            }
            _ => line.to_string(),
        })
        .collect();
    if !found {
        lines.push(format!("{name}={value}"));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
