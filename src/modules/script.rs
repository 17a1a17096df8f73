//! Modules whose entry point is an external script.
//!
//! A script receives `PROVISION_DRY_RUN` from the executor environment and is
//! expected to honour it itself. During a dry run every stdout line starting
//! with `would ` is collected as an intent.
use std::path::PathBuf;

use anyhow::Result;

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome};
use crate::error::ResolutionError;

/// A module implemented by a PowerShell or shell script.
#[derive(Debug, Clone)]
pub struct ScriptModule {
    id: ModuleId,
    path: PathBuf,
}

impl ScriptModule {
    /// Create a script-backed module.
    #[must_use]
    pub const fn new(id: ModuleId, path: PathBuf) -> Self {
        Self { id, path }
    }

    /// Program and leading arguments used to run the script.
    fn interpreter(&self) -> (&'static str, Vec<String>) {
        let path = self.path.display().to_string();
        let is_powershell = self
            .path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("ps1"));
        if is_powershell {
            (
                "powershell",
                vec![
                    "-NoProfile".to_string(),
                    "-ExecutionPolicy".to_string(),
                    "Bypass".to_string(),
                    "-File".to_string(),
                    path,
                ],
            )
        } else {
            ("sh", vec![path])
        }
    }
}

impl Module for ScriptModule {
    fn id(&self) -> ModuleId {
        self.id
    }

    fn resolve(&self) -> Result<(), ResolutionError> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(ResolutionError::ScriptMissing {
                module: self.id,
                path: self.path.clone(),
            })
        }
    }

    fn execute(&self, ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
        let (program, args) = self.interpreter();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        ctx.log.debug(&format!("running {}", self.path.display()));

        let result = ctx.executor.run_unchecked(program, &args)?;
        for line in result.stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if ctx.is_dry_run() && line.starts_with("would ") {
                ctx.record_intent(line);
            } else {
                ctx.log.debug(line);
            }
        }
        if !result.success {
            let detail = result.stderr.trim();
            anyhow::bail!(
                "{} exited with code {}{}",
                self.path.display(),
                result.code.unwrap_or(-1),
                if detail.is_empty() {
                    String::new()
                } else {
                    format!(": {detail}")
                }
            );
        }
        Ok(if ctx.is_dry_run() {
            Outcome::DryRun
        } else {
            Outcome::Ok
        })
    }
}
