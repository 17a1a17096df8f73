//! Terminal fonts (`fonts.toml`).
use serde::Deserialize;

use crate::platform::Os;

/// A font family and the package that provides it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Font {
    /// Family name as listed by the system.
    pub family: String,
    /// Package id.
    pub package: String,
    /// Restrict to one OS.
    pub os: Option<Os>,
}

/// Contents of `fonts.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FontsFile {
    pub(super) fonts: Vec<Font>,
}
