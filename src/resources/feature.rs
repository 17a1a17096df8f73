//! Optional Windows feature resource (DISM).
use anyhow::Result;

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// DISM exit code meaning "succeeded, restart required".
const RESTART_REQUIRED: i32 = 3010;

/// A Windows optional feature that must be enabled.
#[derive(Debug)]
pub struct FeatureResource<'a> {
    /// Feature name (e.g. `Microsoft-Windows-Subsystem-Linux`).
    pub name: String,
    executor: &'a dyn Executor,
}

impl<'a> FeatureResource<'a> {
    /// Create a new feature resource.
    #[must_use]
    pub const fn new(name: String, executor: &'a dyn Executor) -> Self {
        Self { name, executor }
    }
}

impl Resource for FeatureResource<'_> {
    fn description(&self) -> String {
        format!("feature {}", self.name)
    }

    fn current_state(&self) -> Result<ResourceState> {
        let feature = format!("/FeatureName:{}", self.name);
        let result = self.executor.run_unchecked(
            "dism",
            &["/Online", "/Get-FeatureInfo", &feature, "/English"],
        )?;
        if !result.success {
            // Querying needs elevation; an unelevated preview sees this.
            return Ok(ResourceState::Invalid {
                reason: format!("cannot query feature (exit {})", result.code.unwrap_or(-1)),
            });
        }
        let state = result
            .stdout
            .lines()
            .find_map(|l| l.trim().strip_prefix("State :"))
            .map(str::trim)
            .unwrap_or("Unknown");
        Ok(match state {
            "Enabled" | "Enable Pending" => ResourceState::Correct,
            "Disabled" => ResourceState::Missing,
            other => ResourceState::Incorrect {
                current: other.to_string(),
            },
        })
    }

    fn apply(&self) -> Result<ResourceChange> {
        let feature = format!("/FeatureName:{}", self.name);
        let result = self.executor.run_unchecked(
            "dism",
            &[
                "/Online",
                "/Enable-Feature",
                &feature,
                "/All",
                "/NoRestart",
            ],
        )?;
        match result.code {
            Some(0 | RESTART_REQUIRED) => Ok(ResourceChange::Applied),
            code => anyhow::bail!(
                "dism failed to enable {} (exit {}): {}",
                self.name,
                code.unwrap_or(-1),
                result.stdout.trim()
            ),
        }
    }
}
