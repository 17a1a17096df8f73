// Shared helpers for integration tests.
//
// Provides a temporary configuration root and home directory, a recording
// executor that never spawns a process, and a scripted prompter, so each
// integration test can drive a whole run in isolation.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code, clippy::expect_used)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use provision_cli::config::Config;
use provision_cli::dry_run::DryRun;
use provision_cli::exec::{ExecResult, Executor};
use provision_cli::logging::{Log, MemoryLog};
use provision_cli::modules::Context;
use provision_cli::platform::{Os, Platform};
use provision_cli::report::RunReport;
use provision_cli::resources::package::PackageManager;
use provision_cli::selection::Prompter;

/// Configuration used by most integration tests (Linux sections only).
pub const SOFTWARE_TOML: &str = r#"
[cli]
packages = [{ id = "jq", os = "linux" }, { id = "Git.Git", os = "windows" }]
"#;

/// Environment variables.
pub const ENVIRONMENT_TOML: &str = r#"variables = [{ name = "EDITOR", value = "nvim" }]
"#;

/// Git identity.
pub const GIT_TOML: &str = r#"
[identity]
name = "Dev"
email = "dev@example.com"
"#;

/// Shell profile block.
pub const SHELL_TOML: &str = r#"
[linux]
profile = ".bashrc"
lines = ["export PATH=\"$HOME/.local/bin:$PATH\""]
"#;

/// Write the fixture configuration into `<root>/conf/`.
pub fn write_conf(root: &Path) {
    let conf = root.join("conf");
    std::fs::create_dir_all(&conf).expect("create conf dir");
    for (file, content) in [
        ("software.toml", SOFTWARE_TOML),
        ("environment.toml", ENVIRONMENT_TOML),
        ("git.toml", GIT_TOML),
        ("shell.toml", SHELL_TOML),
    ] {
        std::fs::write(conf.join(file), content).expect("write config file");
    }
}

/// An isolated configuration root and home directory.
///
/// Both directories are deleted when the fixture is dropped.
pub struct Fixture {
    /// Configuration root containing `conf/`.
    pub root: tempfile::TempDir,
    /// Stand-in for the user's home directory.
    pub home: tempfile::TempDir,
}

impl Fixture {
    /// Fixture with the standard configuration files.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create root dir");
        let home = tempfile::tempdir().expect("create home dir");
        write_conf(root.path());
        Self { root, home }
    }

    /// Linux platform with apt available.
    pub fn platform() -> Platform {
        Platform::new(Os::Linux, Some(PackageManager::Apt))
    }

    /// Load the fixture configuration.
    pub fn config(&self) -> Config {
        Config::load(self.root.path(), &Self::platform()).expect("load fixture config")
    }

    /// Execution context over this fixture.
    pub fn context(
        &self,
        dry_run: bool,
        executor: Arc<dyn Executor>,
        log: Arc<dyn Log>,
    ) -> Context {
        Context::with_home(
            Arc::new(self.config()),
            Arc::new(Self::platform()),
            log,
            DryRun::new(dry_run),
            executor,
            self.home.path().to_path_buf(),
        )
    }

    /// Context with a fresh [`MemoryLog`], also returned.
    pub fn memory_context(
        &self,
        dry_run: bool,
        executor: Arc<dyn Executor>,
    ) -> (Context, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        let ctx = self.context(dry_run, executor, Arc::clone(&log) as Arc<dyn Log>);
        (ctx, log)
    }

    /// Path of the hardware artifact.
    pub fn artifact(&self) -> std::path::PathBuf {
        self.root.path().join("artifacts").join("hardware.json")
    }
}

/// [`Executor`] that records every command and spawns nothing.
///
/// Every command succeeds. Stdout comes from the first registered prefix
/// that matches the command line, and is empty otherwise.
#[derive(Debug)]
pub struct RecordingExecutor {
    outputs: Vec<(String, String)>,
    programs: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    /// Executor on which `git` and `apt-get` are installed.
    pub fn new() -> Self {
        Self {
            outputs: Vec::new(),
            programs: vec!["git".to_string(), "apt-get".to_string()],
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer commands starting with `prefix` with `stdout`.
    pub fn with_output(mut self, prefix: &str, stdout: &str) -> Self {
        self.outputs.push((prefix.to_string(), stdout.to_string()));
        self
    }

    /// Every command line issued so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Command lines that would change the machine.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| is_mutating(c))
            .collect()
    }

    fn record(&self, program: &str, args: &[&str]) -> ExecResult {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        let stdout = self
            .outputs
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        self.calls.lock().expect("calls lock").push(line);
        ExecResult {
            stdout,
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.record(program, args))
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.record(program, args))
    }

    fn which(&self, program: &str) -> bool {
        self.programs.iter().any(|p| p == program)
    }
}

/// Whether a recorded Linux command line changes the machine.
pub fn is_mutating(call: &str) -> bool {
    call.starts_with("sudo ")
        || call.starts_with("gsettings set ")
        || (call.starts_with("git config --global ") && !call.contains(" --get "))
}

/// [`Prompter`] replaying fixed answers, then reporting end of input.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    /// Number of screens shown.
    pub shown: usize,
}

impl ScriptedPrompter {
    /// Prompter answering with `answers` in order.
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| (*a).to_string()).collect(),
            shown: 0,
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn show(&mut self, _text: &str) {
        self.shown += 1;
    }

    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.answers.pop_front()
    }
}

/// Module ids of a report, in execution order.
pub fn executed_ids(report: &RunReport) -> Vec<String> {
    report
        .results()
        .iter()
        .map(|r| r.module_id.to_string())
        .collect()
}
