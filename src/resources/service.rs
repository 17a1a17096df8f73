//! System service resource (desired state: stopped and disabled).
use anyhow::Result;

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Executor;
use crate::platform::Os;

/// A service that should not start automatically.
#[derive(Debug)]
pub struct ServiceResource<'a> {
    /// Service name (`DiagTrack`, `whoopsie`, …).
    pub name: String,
    os: Os,
    executor: &'a dyn Executor,
}

impl<'a> ServiceResource<'a> {
    /// Create a new service resource.
    #[must_use]
    pub const fn new(name: String, os: Os, executor: &'a dyn Executor) -> Self {
        Self { name, os, executor }
    }
}

impl Resource for ServiceResource<'_> {
    fn description(&self) -> String {
        format!("service {}", self.name)
    }

    fn current_state(&self) -> Result<ResourceState> {
        match self.os {
            Os::Windows => {
                let result = self.executor.run_unchecked("sc", &["qc", &self.name])?;
                if !result.success {
                    return Ok(ResourceState::Invalid {
                        reason: "service not installed".to_string(),
                    });
                }
                let start_type = result
                    .stdout
                    .lines()
                    .find(|l| l.contains("START_TYPE"))
                    .and_then(|l| l.split_whitespace().last())
                    .unwrap_or("UNKNOWN")
                    .to_string();
                if start_type == "DISABLED" {
                    Ok(ResourceState::Correct)
                } else {
                    Ok(ResourceState::Incorrect {
                        current: start_type.to_lowercase(),
                    })
                }
            }
            Os::Linux => {
                // `is-enabled` exits non-zero for disabled units, so only
                // stdout is meaningful.
                let result = self
                    .executor
                    .run_unchecked("systemctl", &["is-enabled", &self.name])?;
                match result.stdout.trim() {
                    "disabled" | "masked" => Ok(ResourceState::Correct),
                    "" | "not-found" => Ok(ResourceState::Invalid {
                        reason: "service not installed".to_string(),
                    }),
                    other => Ok(ResourceState::Incorrect {
                        current: other.to_string(),
                    }),
                }
            }
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.os {
            Os::Windows => {
                self.executor
                    .run("sc", &["config", &self.name, "start=", "disabled"])?;
                // Stopping an already-stopped service fails; that is fine.
                self.executor.run_unchecked("sc", &["stop", &self.name])?;
            }
            Os::Linux => {
                self.executor
                    .run("sudo", &["systemctl", "disable", "--now", &self.name])?;
            }
        }
        Ok(ResourceChange::Applied)
    }
}
