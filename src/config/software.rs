//! Software manifest (`software.toml`): categories of packages.
use std::collections::BTreeMap;

use serde::Deserialize;

use crate::platform::Platform;

/// One installable package.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SoftwarePackage {
    /// Package id understood by the package manager (e.g. `Git.Git`).
    pub id: String,
    /// Display name; falls back to the id.
    pub name: Option<String>,
    /// Alternate source (e.g. `msstore`).
    pub source: Option<String>,
    /// Restrict to one OS.
    pub os: Option<crate::platform::Os>,
}

impl SoftwarePackage {
    /// Human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CategorySection {
    packages: Vec<SoftwarePackage>,
}

/// A named group of packages, in manifest order of category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareCategory {
    /// Category (top-level table name).
    pub name: String,
    /// Packages applicable to the current platform.
    pub packages: Vec<SoftwarePackage>,
}

/// Raw manifest: top-level tables are categories.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub(super) struct SoftwareManifest(BTreeMap<String, CategorySection>);

impl SoftwareManifest {
    /// Keep packages for `platform`, dropping categories left empty.
    pub(super) fn for_platform(self, platform: &Platform) -> Vec<SoftwareCategory> {
        self.0
            .into_iter()
            .filter_map(|(name, section)| {
                let packages: Vec<_> = section
                    .packages
                    .into_iter()
                    .filter(|p| platform.includes(p.os))
                    .collect();
                (!packages.is_empty()).then_some(SoftwareCategory { name, packages })
            })
            .collect()
    }
}
