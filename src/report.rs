//! Per-module results and the run report.
use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::logging::Log;
use crate::modules::Outcome;
use crate::modules::registry::{ModuleDescriptor, ModuleId};

/// How a module finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleStatus {
    /// Completed.
    Ok,
    /// Nothing to do on this machine.
    Skipped,
    /// Preview only; see the intents.
    DryRun,
    /// Did not complete.
    Failed,
}

/// Why a module failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Entry point missing; the module never ran.
    Resolution,
    /// The module returned an error.
    Execution,
    /// An upstream artifact was missing or unreadable.
    HandOff,
    /// The module panicked.
    Fault,
}

/// Result of running one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleResult {
    /// Module id.
    pub module_id: ModuleId,
    /// Label shown in logs.
    pub display_name: String,
    /// Final status.
    pub status: ModuleStatus,
    /// `false` only for [`ModuleStatus::Failed`].
    pub succeeded: bool,
    /// Wall-clock time spent in the module.
    pub duration_seconds: f64,
    /// Top-level error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Failure classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    /// Error causes below the top-level message.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
    /// Skip reason or the module's one-line summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// What a dry run would have changed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<String>,
}

impl ModuleResult {
    /// Result for a module that returned normally.
    #[must_use]
    pub fn completed(
        descriptor: &ModuleDescriptor,
        outcome: Outcome,
        duration_seconds: f64,
        summary: Option<String>,
        intents: Vec<String>,
    ) -> Self {
        let (status, note) = match outcome {
            Outcome::Ok => (ModuleStatus::Ok, summary),
            Outcome::Skipped(reason) => (ModuleStatus::Skipped, Some(reason)),
            Outcome::DryRun => (ModuleStatus::DryRun, summary),
        };
        Self {
            module_id: descriptor.id,
            display_name: descriptor.display_name.to_string(),
            status,
            succeeded: true,
            duration_seconds: duration_seconds.max(0.0),
            error_detail: None,
            failure_kind: None,
            trace: Vec::new(),
            note,
            intents,
        }
    }

    /// Result for a module that failed.
    #[must_use]
    pub fn failed(
        descriptor: &ModuleDescriptor,
        kind: FailureKind,
        detail: String,
        trace: Vec<String>,
        duration_seconds: f64,
    ) -> Self {
        Self {
            module_id: descriptor.id,
            display_name: descriptor.display_name.to_string(),
            status: ModuleStatus::Failed,
            succeeded: false,
            duration_seconds: duration_seconds.max(0.0),
            error_detail: Some(detail),
            failure_kind: Some(kind),
            trace,
            note: None,
            intents: Vec::new(),
        }
    }

    /// Attach intents recorded before a failure.
    #[must_use]
    pub fn with_intents(mut self, intents: Vec<String>) -> Self {
        self.intents = intents;
        self
    }
}

/// All results of one run, in execution order.
#[derive(Debug, Clone)]
pub struct RunReport {
    started_at: DateTime<Local>,
    finished_at: Option<DateTime<Local>>,
    dry_run: bool,
    results: Vec<ModuleResult>,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    started_at: String,
    dry_run: bool,
    executed: usize,
    succeeded: usize,
    failed: usize,
    total_duration_seconds: f64,
    module_duration_seconds: f64,
    results: &'a [ModuleResult],
}

impl RunReport {
    /// Empty report for a run started at `started_at`.
    #[must_use]
    pub const fn new(started_at: DateTime<Local>, dry_run: bool) -> Self {
        Self {
            started_at,
            finished_at: None,
            dry_run,
            results: Vec::new(),
        }
    }

    /// Mark the run as finished at `at`.
    pub const fn finish(&mut self, at: DateTime<Local>) {
        self.finished_at = Some(at);
    }

    /// Append a result.
    pub fn push(&mut self, result: ModuleResult) {
        self.results.push(result);
    }

    /// Results in execution order.
    #[must_use]
    pub fn results(&self) -> &[ModuleResult] {
        &self.results
    }

    /// When the run started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Whether the run was a preview.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Number of modules executed.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.results.len()
    }

    /// Number of modules that succeeded.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    /// Number of modules that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.executed() - self.succeeded()
    }

    /// Failed results.
    pub fn failures(&self) -> impl Iterator<Item = &ModuleResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }

    /// Wall-clock seconds from the start of the run to its finish, or to
    /// now while the run is still open.
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Local::now);
        (end - self.started_at)
            .to_std()
            .map_or(0.0, |d| d.as_secs_f64())
    }

    /// Sum of module durations.
    #[must_use]
    pub fn module_seconds(&self) -> f64 {
        self.results.iter().map(|r| r.duration_seconds).sum()
    }

    /// Log the summary.
    pub fn render(&self, log: &dyn Log, log_file: Option<&Path>) {
        if self.dry_run {
            log.stage("Summary (dry run)");
        } else {
            log.stage("Summary");
        }

        for result in &self.results {
            let icon = match result.status {
                ModuleStatus::Ok => "✓",
                ModuleStatus::Skipped => "○",
                ModuleStatus::DryRun => "~",
                ModuleStatus::Failed => "✗",
            };
            let suffix = result
                .note
                .as_deref()
                .or(result.error_detail.as_deref())
                .map(|m| format!(" ({m})"))
                .unwrap_or_default();
            let line = format!("{icon} {}{suffix}", result.display_name);
            if result.succeeded {
                log.info(&line);
            } else {
                log.error(&line);
            }
        }

        log.info(&format!(
            "{} modules executed: {} succeeded, {} failed",
            self.executed(),
            self.succeeded(),
            self.failed()
        ));
        for failure in self.failures() {
            log.error(&format!(
                "failed: {} ({}): {}",
                failure.display_name,
                failure.module_id,
                failure.error_detail.as_deref().unwrap_or("unknown error")
            ));
        }
        log.info(&format!(
            "total time: {:.1}s ({:.1}s in modules)",
            self.total_seconds(),
            self.module_seconds()
        ));

        match log_file {
            Some(path) => log.info(&format!("log: {}", path.display())),
            None => log.warn("run log file unavailable; output was console only"),
        }
    }

    /// Write the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let document = ReportDocument {
            started_at: self.started_at.to_rfc3339(),
            dry_run: self.dry_run,
            executed: self.executed(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            total_duration_seconds: self.total_seconds(),
            module_duration_seconds: self.module_seconds(),
            results: &self.results,
        };
        let json = serde_json::to_string_pretty(&document).context("serializing run report")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }
}
