//! Driver rules (`drivers.toml`): hardware vendor → package.
use serde::Deserialize;

use crate::modules::hardware::{DeviceClass, Vendor};
use crate::platform::Os;

/// Install `package` when a device from `vendor` (optionally of `class`)
/// is present.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DriverRule {
    /// Vendor the rule applies to.
    pub vendor: Vendor,
    /// Device class; any class when absent.
    pub class: Option<DeviceClass>,
    /// Driver package id.
    pub package: String,
    /// Alternate package source.
    pub source: Option<String>,
    /// Restrict to one OS.
    pub os: Option<Os>,
}

/// Contents of `drivers.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct DriversFile {
    pub(super) drivers: Vec<DriverRule>,
}
