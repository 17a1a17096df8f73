//! Global git configuration entry.
use anyhow::Result;

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// One `git config --global` key with its desired value.
#[derive(Debug)]
pub struct GitConfigResource<'a> {
    /// Config key (e.g. `user.email`).
    pub key: String,
    /// Desired value.
    pub value: String,
    executor: &'a dyn Executor,
}

impl<'a> GitConfigResource<'a> {
    /// Create a new git config resource.
    #[must_use]
    pub const fn new(key: String, value: String, executor: &'a dyn Executor) -> Self {
        Self {
            key,
            value,
            executor,
        }
    }
}

impl Resource for GitConfigResource<'_> {
    fn description(&self) -> String {
        format!("git {} = {}", self.key, self.value)
    }

    fn current_state(&self) -> Result<ResourceState> {
        // git may have been installed earlier in this run, so this is checked
        // per entry rather than once at startup.
        if !self.executor.which("git") {
            return Ok(ResourceState::Invalid {
                reason: "git is not installed".to_string(),
            });
        }
        let result = self
            .executor
            .run_unchecked("git", &["config", "--global", "--get", &self.key])?;
        let current = result.stdout.trim();
        Ok(if !result.success || current.is_empty() {
            ResourceState::Missing
        } else if current == self.value {
            ResourceState::Correct
        } else {
            ResourceState::Incorrect {
                current: current.to_string(),
            }
        })
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.executor
            .run("git", &["config", "--global", &self.key, &self.value])?;
        Ok(ResourceChange::Applied)
    }
}
