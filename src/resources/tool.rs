//! Command-line tool prerequisite: present on `PATH`, else installed.
use anyhow::Result;

use super::package::PackageResource;
use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// A tool that must be callable by name.
#[derive(Debug)]
pub struct ToolResource<'a> {
    /// Executable name looked up on `PATH`.
    pub command: String,
    package: Option<PackageResource<'a>>,
    executor: &'a dyn Executor,
}

impl<'a> ToolResource<'a> {
    /// Create a tool resource; `package` installs it when missing.
    #[must_use]
    pub const fn new(
        command: String,
        package: Option<PackageResource<'a>>,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            command,
            package,
            executor,
        }
    }
}

impl Resource for ToolResource<'_> {
    fn description(&self) -> String {
        match &self.package {
            Some(pkg) => format!("{} (via {})", self.command, pkg.description()),
            None => self.command.clone(),
        }
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.executor.which(&self.command) {
            Ok(ResourceState::Correct)
        } else if self.package.is_none() {
            Ok(ResourceState::Invalid {
                reason: "not on PATH and no package manager to install it".to_string(),
            })
        } else {
            Ok(ResourceState::Missing)
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        match &self.package {
            Some(pkg) => pkg.apply(),
            None => anyhow::bail!("no package available for {}", self.command),
        }
    }
}
