//! Process execution behind the [`Executor`] trait.
use anyhow::{Context, Result, bail};
use std::process::{Command, Output};

use crate::dry_run::{DRY_RUN_ENV, DryRun};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not terminated by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over process execution.
///
/// Modules and resources never spawn processes directly; they go through
/// this trait so tests can observe every command (and assert that a dry run
/// issues no mutating ones).
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, allowing failure (returns result without bailing).
    ///
    /// # Errors
    ///
    /// Returns an error only if the program cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] backed by [`std::process::Command`].
///
/// Every child process inherits [`DRY_RUN_ENV`] so script entry points see
/// the same dry-run state as in-process modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor {
    dry_run: DryRun,
}

impl SystemExecutor {
    /// Create an executor that exports `dry_run` to its children.
    #[must_use]
    pub const fn new(dry_run: DryRun) -> Self {
        Self { dry_run }
    }

    fn command(&self, program: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args).env(DRY_RUN_ENV, self.dry_run.env_value());
        cmd
    }
}

/// Execute a command and return the result, bailing on non-zero exit.
fn execute_checked(mut cmd: Command, label: &str) -> Result<ExecResult> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to execute: {label}"))?;
    let result = ExecResult::from(output);
    if !result.success {
        bail!(
            "{label} failed (exit {}): {}",
            result.code.unwrap_or(-1),
            result.stderr.trim()
        );
    }
    Ok(result)
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        execute_checked(self.command(program, args), program)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = self
            .command(program, args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: run a simple echo command cross-platform.
    fn echo_result(msg: &str) -> Result<ExecResult> {
        let exec = SystemExecutor::default();
        #[cfg(windows)]
        {
            exec.run("cmd", &["/C", "echo", msg])
        }
        #[cfg(not(windows))]
        {
            exec.run("echo", &[msg])
        }
    }

    #[test]
    fn run_echo() {
        let result = echo_result("hello").unwrap();
        assert!(result.success, "echo command should succeed");
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn run_failure() {
        let exec = SystemExecutor::default();
        #[cfg(windows)]
        let result = exec.run("cmd", &["/C", "exit", "1"]);
        #[cfg(not(windows))]
        let result = exec.run("false", &[]);
        assert!(result.is_err(), "non-zero exit should produce an error");
    }

    #[test]
    fn run_unchecked_failure() {
        let exec = SystemExecutor::default();
        #[cfg(windows)]
        let result = exec.run_unchecked("cmd", &["/C", "exit", "1"]).unwrap();
        #[cfg(not(windows))]
        let result = exec.run_unchecked("false", &[]).unwrap();
        assert!(!result.success, "non-zero exit should set success=false");
    }

    #[test]
    #[cfg(not(windows))]
    fn children_inherit_dry_run_flag() {
        let exec = SystemExecutor::new(DryRun::new(true));
        let result = exec
            .run("sh", &["-c", &format!("echo ${DRY_RUN_ENV}")])
            .unwrap();
        assert_eq!(result.stdout.trim(), "1");
    }

    #[test]
    fn which_missing_program() {
        let exec = SystemExecutor::default();
        assert!(
            !exec.which("this-program-does-not-exist-12345"),
            "non-existent program should not be found"
        );
    }
}
