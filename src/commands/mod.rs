//! Subcommand implementations and configuration root discovery.
pub mod provision;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable naming the configuration root.
pub const ROOT_ENV: &str = "PROVISION_ROOT";

/// Resolve the configuration root from `--root`, `PROVISION_ROOT`, the
/// executable's location or the current directory, in that order.
///
/// # Errors
///
/// Returns [`ConfigError::RootNotFound`] if no candidate holds a `conf/`
/// directory.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_root_from(
        explicit,
        std::env::var_os(ROOT_ENV).map(PathBuf::from),
        exe_dir.as_deref(),
        std::env::current_dir().ok().as_deref(),
    )
}

/// [`resolve_root`] over explicit inputs.
///
/// An explicit or environment root is trusted as given; discovered
/// locations must contain `conf/`.
///
/// # Errors
///
/// Returns [`ConfigError::RootNotFound`] if nothing qualifies.
pub fn resolve_root_from(
    explicit: Option<&Path>,
    env_root: Option<PathBuf>,
    exe_dir: Option<&Path>,
    cwd: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }
    if let Some(root) = env_root.filter(|r| !r.as_os_str().is_empty()) {
        return Ok(root);
    }

    // Installed next to the binary, or one level up from bin/.
    let discovered = exe_dir
        .into_iter()
        .flat_map(|dir| [dir.to_path_buf(), dir.join("..")])
        .chain(cwd.map(Path::to_path_buf))
        .find(|candidate| candidate.join("conf").is_dir());

    match discovered {
        Some(root) => Ok(std::fs::canonicalize(&root).unwrap_or(root)),
        None => Err(ConfigError::RootNotFound),
    }
}
