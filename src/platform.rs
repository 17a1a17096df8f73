//! Host operating system and package manager detection.
use std::fmt;

use serde::Deserialize;

use crate::exec::Executor;
use crate::resources::package::PackageManager;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Any Linux distribution.
    Linux,
    /// Windows 10 or later.
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
    /// First supported package manager found on PATH.
    pub package_manager: Option<PackageManager>,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect(executor: &dyn Executor) -> Self {
        let os = Self::detect_os();
        Self {
            os,
            package_manager: PackageManager::detect(os, executor),
        }
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub const fn new(os: Os, package_manager: Option<PackageManager>) -> Self {
        Self {
            os,
            package_manager,
        }
    }

    /// `true` on Linux.
    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }

    /// `true` on Windows.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Whether a config entry restricted to `os` applies here.
    ///
    /// Entries without an OS restriction apply everywhere.
    #[must_use]
    pub fn includes(&self, os: Option<Os>) -> bool {
        os.is_none_or(|o| o == self.os)
    }

    const fn detect_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            // Default to Linux for other Unix-like systems
            Os::Linux
        }
    }
}
