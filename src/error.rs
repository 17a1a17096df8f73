//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors (e.g., [`ConfigError`],
//! [`HandOffError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ProvisionError
//! ├── Config(ConfigError)             — TOML reading and parsing
//! ├── Resolution(ResolutionError)     — module entry point cannot be located
//! ├── Precondition(PreconditionError) — privileges, bootstrap package manager
//! └── HandOff(HandOffError)           — upstream module artifact missing
//! ```
//!
//! Errors raised from inside a module are plain [`anyhow::Error`]s; the
//! module runner converts them into failed results.

use std::path::PathBuf;

use thiserror::Error;

use crate::modules::registry::ModuleId;

/// Top-level error type for the provisioning engine.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A module entry point could not be resolved.
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// A startup precondition is not met.
    #[error("Precondition error: {0}")]
    Precondition(#[from] PreconditionError),

    /// A data hand-off between modules failed.
    #[error("Hand-off error: {0}")]
    HandOff(#[from] HandOffError),
}

/// Errors that arise from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("IO error reading config file {}: {source}", .path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file is not valid TOML or does not match the expected shape.
    #[error("Invalid TOML in {}: {message}", .path.display())]
    InvalidSyntax {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The configuration root could not be determined.
    #[error("cannot determine configuration root. Use --root or set PROVISION_ROOT")]
    RootNotFound,
}

/// A selected module's entry point cannot be located.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No entry point is registered for the module id.
    #[error("no entry point registered for module '{0}'")]
    NotRegistered(ModuleId),

    /// The module is backed by a script that does not exist.
    #[error("script for module '{module}' not found: {}", .path.display())]
    ScriptMissing {
        /// Module whose script is missing.
        module: ModuleId,
        /// Expected script location.
        path: PathBuf,
    },
}

/// Startup preconditions checked before any module runs.
#[derive(Error, Debug)]
pub enum PreconditionError {
    /// The process lacks administrative rights.
    #[error("administrative privileges are required for a real run")]
    NotElevated,

    /// No supported package manager is available and it could not be installed.
    #[error("no supported package manager found ({0})")]
    BootstrapUnavailable(String),
}

/// A module's expected upstream artifact is unavailable.
#[derive(Error, Debug)]
pub enum HandOffError {
    /// The artifact file does not exist.
    #[error("hardware report not found at {} (run hardware detection first)", .0.display())]
    MissingArtifact(PathBuf),

    /// The artifact exists but cannot be parsed.
    #[error("hardware report at {} is unreadable: {message}", .path.display())]
    Unreadable {
        /// Artifact path.
        path: PathBuf,
        /// Reason.
        message: String,
    },
}
