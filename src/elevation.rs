//! Administrative-privilege check and elevated relaunch.
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};

use crate::exec::Executor;
use crate::platform::Os;

/// Privilege inspection and relaunch, behind a trait so the privilege gate
/// can be tested without touching the real process.
#[cfg_attr(test, mockall::automock)]
pub trait Elevation {
    /// `true` when mutating modules can run with the rights they need.
    fn is_elevated(&self) -> bool;

    /// Start an elevated copy of this program with `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if the elevated process could not be started.
    fn relaunch(&self, args: &[String]) -> Result<()>;
}

/// [`Elevation`] for the running process.
///
/// On Windows this means an administrator token. On Linux root is accepted,
/// and so is `sudo` that works without asking for a password, since
/// mutating commands are issued through it one at a time. A `sudo` that
/// needs a password is what the relaunch is for.
#[derive(Debug, Clone)]
pub struct SystemElevation {
    os: Os,
    executor: Arc<dyn Executor>,
}

impl SystemElevation {
    /// Create a checker for `os`.
    #[must_use]
    pub const fn new(os: Os, executor: Arc<dyn Executor>) -> Self {
        Self { os, executor }
    }

    /// `sudo -n` fails instead of prompting when a password is required.
    fn passwordless_sudo(&self) -> bool {
        self.executor.which("sudo")
            && self
                .executor
                .run_unchecked("sudo", &["-n", "true"])
                .is_ok_and(|r| r.success)
    }
}

impl Elevation for SystemElevation {
    fn is_elevated(&self) -> bool {
        match self.os {
            // `net session` is refused without an administrator token.
            Os::Windows => self
                .executor
                .run_unchecked("net", &["session"])
                .is_ok_and(|r| r.success),
            Os::Linux => {
                let root = self
                    .executor
                    .run_unchecked("id", &["-u"])
                    .is_ok_and(|r| r.success && r.stdout.trim() == "0");
                root || self.passwordless_sudo()
            }
        }
    }

    fn relaunch(&self, args: &[String]) -> Result<()> {
        let exe = std::env::current_exe().context("locating the running executable")?;
        let exe = exe.display().to_string();
        match self.os {
            Os::Windows => {
                let script = start_process_script(&exe, args);
                self.executor
                    .run("powershell", &["-NoProfile", "-Command", &script])
                    .context("starting elevated process")?;
                Ok(())
            }
            Os::Linux => {
                if !self.executor.which("sudo") {
                    bail!("sudo is not installed; re-run as root");
                }
                let status = std::process::Command::new("sudo")
                    .arg(&exe)
                    .args(args)
                    .status()
                    .context("starting elevated process")?;
                if !status.success() {
                    bail!(
                        "elevated process exited with code {}",
                        status.code().unwrap_or(-1)
                    );
                }
                Ok(())
            }
        }
    }
}

/// PowerShell that starts `exe` with `args` through the UAC prompt.
fn start_process_script(exe: &str, args: &[String]) -> String {
    let quote = |s: &str| format!("'{}'", s.replace('\'', "''"));
    let mut script = format!("Start-Process -FilePath {} -Verb RunAs", quote(exe));
    if !args.is_empty() {
        let list: Vec<String> = args.iter().map(|a| quote(a)).collect();
        script.push_str(" -ArgumentList ");
        script.push_str(&list.join(","));
    }
    script
}
