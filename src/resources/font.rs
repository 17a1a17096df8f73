//! Terminal font resource, installed through the package manager.
use anyhow::Result;

use super::package::{PackageManager, PackageResource};
use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Executor;
use crate::platform::Os;

/// Registry keys listing installed fonts on Windows (machine and per-user).
const WINDOWS_FONT_KEYS: [&str; 2] = [
    "HKLM\\SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\\Fonts",
    "HKCU\\SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\\Fonts",
];

/// Query installed font names once and return the raw listing.
///
/// # Errors
///
/// Returns an error if the listing command cannot be spawned.
pub fn installed_fonts(os: Os, executor: &dyn Executor) -> Result<String> {
    match os {
        Os::Linux => {
            let result = executor.run_unchecked("fc-list", &[":", "family"])?;
            Ok(if result.success {
                result.stdout
            } else {
                String::new()
            })
        }
        Os::Windows => {
            let mut listing = String::new();
            for key in WINDOWS_FONT_KEYS {
                let result = executor.run_unchecked("reg", &["query", key])?;
                if result.success {
                    listing.push_str(&result.stdout);
                }
            }
            Ok(listing)
        }
    }
}

/// A font family that must be present.
#[derive(Debug)]
pub struct FontResource<'a> {
    /// Family name as reported by the font listing.
    pub family: String,
    package: PackageResource<'a>,
    executor: &'a dyn Executor,
}

impl<'a> FontResource<'a> {
    /// Create a font resource installed from `package`.
    #[must_use]
    pub const fn new(
        family: String,
        package: String,
        manager: PackageManager,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            family,
            package: PackageResource::new(package, manager, executor),
            executor,
        }
    }

    /// Determine the state from a listing returned by [`installed_fonts`].
    #[must_use]
    pub fn state_from_listing(&self, listing: &str) -> ResourceState {
        let needle = self.family.to_lowercase();
        if listing.to_lowercase().contains(&needle) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        }
    }
}

impl Resource for FontResource<'_> {
    fn description(&self) -> String {
        format!("{} (via {})", self.family, self.package.description())
    }

    fn current_state(&self) -> Result<ResourceState> {
        let os = if self.package.manager == PackageManager::Winget {
            Os::Windows
        } else {
            Os::Linux
        };
        let listing = installed_fonts(os, self.executor)?;
        Ok(self.state_from_listing(&listing))
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.package.apply()
    }
}
