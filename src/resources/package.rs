//! Package installation resource.
use std::collections::HashSet;

use anyhow::{Result, bail};

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::{ExecResult, Executor};
use crate::logging::Log;
use crate::platform::Os;

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Windows Package Manager.
    Winget,
    /// Debian / Ubuntu.
    Apt,
    /// Fedora / RHEL.
    Dnf,
    /// Arch Linux.
    Pacman,
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.program())
    }
}

impl PackageManager {
    /// Linux managers in detection order.
    const LINUX: [Self; 3] = [Self::Apt, Self::Dnf, Self::Pacman];

    /// Executable that identifies this manager on `PATH`.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Winget => "winget",
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
        }
    }

    /// Find the package manager available on this machine.
    ///
    /// Read-only: only `PATH` lookups are performed.
    #[must_use]
    pub fn detect(os: Os, executor: &dyn Executor) -> Option<Self> {
        match os {
            Os::Windows => executor.which("winget").then_some(Self::Winget),
            Os::Linux => Self::LINUX
                .into_iter()
                .find(|pm| executor.which(pm.program())),
        }
    }

    /// Command that refreshes the manager's package sources.
    #[must_use]
    pub const fn refresh_command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Winget => ("winget", &["source", "update"]),
            Self::Apt => ("sudo", &["apt-get", "update"]),
            Self::Dnf => ("sudo", &["dnf", "makecache"]),
            Self::Pacman => ("sudo", &["pacman", "-Sy"]),
        }
    }
}

/// A system package resource that can be checked and installed.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// Package name (or winget ID).
    pub id: String,
    /// Package manager to use.
    pub manager: PackageManager,
    /// Alternate source (winget only, e.g. `msstore`).
    pub source: Option<String>,
    executor: &'a dyn Executor,
}

impl<'a> PackageResource<'a> {
    /// Create a new package resource.
    #[must_use]
    pub const fn new(id: String, manager: PackageManager, executor: &'a dyn Executor) -> Self {
        Self {
            id,
            manager,
            source: None,
            executor,
        }
    }

    /// Install from an alternate source.
    #[must_use]
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    /// Determine the resource state from a pre-fetched set of installed package names.
    ///
    /// This avoids running a per-package query when used with
    /// [`installed_packages`].
    #[must_use]
    pub fn state_from_installed(&self, installed: &HashSet<String>) -> ResourceState {
        if installed.contains(&self.id) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        }
    }
}

/// Query the full set of installed package names for a given manager.
///
/// Runs a **single** read-only command regardless of how many packages
/// need to be checked. A listing that fails is logged as a warning and
/// yields an empty set, so every package is then treated as missing.
///
/// # Errors
///
/// Returns an error if the package manager command cannot be spawned.
pub fn installed_packages(
    manager: PackageManager,
    executor: &dyn Executor,
    log: &dyn Log,
) -> Result<HashSet<String>> {
    let result = list_installed(manager, executor)?;
    if !result.success {
        log.warn(&format!(
            "could not list installed {manager} packages ({}); treating all as missing",
            result.stderr.trim()
        ));
        return Ok(HashSet::new());
    }
    Ok(parse_installed(manager, &result.stdout))
}

fn list_installed(manager: PackageManager, executor: &dyn Executor) -> Result<ExecResult> {
    match manager {
        // `winget list` prints a table; winget IDs are reverse-domain names
        // (e.g. `Git.Git`) so exact token matches are unambiguous.
        PackageManager::Winget => executor.run_unchecked(
            "winget",
            &[
                "list",
                "--accept-source-agreements",
                "--disable-interactivity",
            ],
        ),
        PackageManager::Apt => executor.run_unchecked("dpkg-query", &["-W", "-f=${Package}\\n"]),
        PackageManager::Dnf => executor.run_unchecked("rpm", &["-qa", "--qf", "%{NAME}\\n"]),
        PackageManager::Pacman => executor.run_unchecked("pacman", &["-Qq"]),
    }
}

fn parse_installed(manager: PackageManager, stdout: &str) -> HashSet<String> {
    let mut set = HashSet::new();
    for line in stdout.lines() {
        match manager {
            PackageManager::Winget => {
                set.extend(line.split_whitespace().map(str::to_string));
            }
            _ => {
                if let Some(name) = line.split_whitespace().next() {
                    set.insert(name.to_string());
                }
            }
        }
    }
    set
}

impl Resource for PackageResource<'_> {
    fn description(&self) -> String {
        match &self.source {
            Some(source) => format!("{} ({}, source {source})", self.id, self.manager),
            None => format!("{} ({})", self.id, self.manager),
        }
    }

    fn current_state(&self) -> Result<ResourceState> {
        let result = list_installed(self.manager, self.executor)?;
        if !result.success {
            bail!(
                "could not list installed {} packages: {}",
                self.manager,
                result.stderr.trim()
            );
        }
        Ok(self.state_from_installed(&parse_installed(self.manager, &result.stdout)))
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.manager {
            PackageManager::Winget => {
                let source = self.source.as_deref().unwrap_or("winget");
                let result = self.executor.run_unchecked(
                    "winget",
                    &[
                        "install",
                        "--id",
                        &self.id,
                        "--exact",
                        "--source",
                        source,
                        "--accept-source-agreements",
                        "--accept-package-agreements",
                    ],
                )?;
                if result.success {
                    Ok(ResourceChange::Applied)
                } else {
                    // winget writes most diagnostics to stdout.
                    let detail = if result.stderr.trim().is_empty() {
                        result.stdout.trim().to_string()
                    } else {
                        format!("{}\n{}", result.stdout.trim(), result.stderr.trim())
                    };
                    Ok(ResourceChange::Skipped {
                        reason: format!("winget install failed: {detail}"),
                    })
                }
            }
            PackageManager::Apt => {
                self.executor
                    .run("sudo", &["apt-get", "install", "-y", &self.id])?;
                Ok(ResourceChange::Applied)
            }
            PackageManager::Dnf => {
                self.executor.run("sudo", &["dnf", "install", "-y", &self.id])?;
                Ok(ResourceChange::Applied)
            }
            PackageManager::Pacman => {
                self.executor.run(
                    "sudo",
                    &["pacman", "-S", "--needed", "--noconfirm", &self.id],
                )?;
                Ok(ResourceChange::Applied)
            }
        }
    }
}
