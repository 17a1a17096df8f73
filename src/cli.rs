//! Command-line surface of the `provision` binary.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::modules::registry::Toggle;
use crate::selection::{RunConfiguration, SelectionInput};

/// Command-line interface of the provisioning orchestrator.
///
/// Without selection flags an interactive menu is shown. Any `--skip-*`
/// flag, `--dry-run` or `--no-menu` bypasses it.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "provision",
    about = "Provision a fresh machine into a configured developer workstation",
    version
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Skip software installation
    #[arg(long)]
    pub skip_software: bool,

    /// Skip system preference tweaks
    #[arg(long)]
    pub skip_system_config: bool,

    /// Skip environment variables
    #[arg(long)]
    pub skip_environment: bool,

    /// Skip hardware detection and driver installation
    #[arg(long)]
    pub skip_drivers: bool,

    /// Skip enabling WSL
    #[arg(long)]
    pub skip_wsl: bool,

    /// Skip the telemetry opt-out
    #[arg(long)]
    pub skip_telemetry: bool,

    /// Skip the shell profile
    #[arg(long)]
    pub skip_powershell: bool,

    /// Skip git identity
    #[arg(long)]
    pub skip_git_config: bool,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Never show the interactive menu
    #[arg(long)]
    pub no_menu: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration root (parent of `conf/`)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Also write the run report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Toggles named by `--skip-*` flags.
    #[must_use]
    pub fn skips(&self) -> BTreeSet<Toggle> {
        [
            (self.skip_software, Toggle::Software),
            (self.skip_system_config, Toggle::SystemConfig),
            (self.skip_environment, Toggle::Environment),
            (self.skip_drivers, Toggle::Drivers),
            (self.skip_wsl, Toggle::Wsl),
            (self.skip_telemetry, Toggle::Telemetry),
            (self.skip_powershell, Toggle::PowerShell),
            (self.skip_git_config, Toggle::GitConfig),
        ]
        .into_iter()
        .filter_map(|(set, toggle)| set.then_some(toggle))
        .collect()
    }

    /// Selection-related part of the command line.
    #[must_use]
    pub fn selection(&self) -> SelectionInput {
        SelectionInput {
            skips: self.skips(),
            dry_run_flag: self.dry_run,
            no_menu: self.no_menu,
        }
    }

    /// Full argument list for an elevated copy of this run.
    ///
    /// Carries the resolved selection plus `--root`, `--report` and `-v`.
    /// Paths are made absolute because the elevated process may start in a
    /// different working directory and without this process's environment.
    #[must_use]
    pub fn relaunch_args(&self, run: &RunConfiguration, root: &Path) -> Vec<String> {
        let mut args = run.relaunch_args();
        args.push("--root".to_string());
        args.push(absolute(root).display().to_string());
        if let Some(report) = &self.report {
            args.push("--report".to_string());
            args.push(absolute(report).display().to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        args
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
