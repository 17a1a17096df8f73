//! Drives one provisioning run from selection to summary.
//!
//! The orchestrator owns no module logic. It resolves the selection, passes
//! the privilege gate, walks the master table in order handing each selected
//! module to the [runner](crate::runner), and finally renders the report.
//! A failing module never stops the walk.
use std::path::Path;

use chrono::{DateTime, Local};

use crate::dry_run::DryRun;
use crate::elevation::Elevation;
use crate::error::PreconditionError;
use crate::logging::Log;
use crate::modules::registry::{Registry, descriptors};
use crate::modules::{Context, Handoff};
use crate::report::RunReport;
use crate::runner;
use crate::selection::{self, Prompter, RunConfiguration, SelectionInput};

/// Where the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has happened yet.
    Idle,
    /// Reading flags or driving the menu.
    ResolvingSelection,
    /// Walking the master table.
    RunningModules,
    /// Rendering the summary.
    Reporting,
    /// Finished, or cancelled before any module ran.
    Done,
}

/// Result of the privilege gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Continue in this process.
    Proceed,
    /// An elevated copy took over; this process should exit.
    Relaunched,
}

/// Sequences a single run.
#[derive(Debug)]
pub struct Orchestrator {
    phase: Phase,
    started_at: DateTime<Local>,
}

impl Orchestrator {
    /// New orchestrator for a run started at `started_at`.
    #[must_use]
    pub const fn new(started_at: DateTime<Local>) -> Self {
        Self {
            phase: Phase::Idle,
            started_at,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Turn flags or menu answers into a run configuration.
    ///
    /// `None` means the user quit; the run is then [`Phase::Done`] without
    /// having executed anything.
    pub fn resolve_selection(
        &mut self,
        input: &SelectionInput,
        dry_run: DryRun,
        prompter: &mut dyn Prompter,
        log: &dyn Log,
    ) -> Option<RunConfiguration> {
        self.phase = Phase::ResolvingSelection;
        let config = selection::resolve(input, dry_run, prompter, log);
        if config.is_none() {
            self.phase = Phase::Done;
        }
        config
    }

    /// Check privileges for a real run.
    ///
    /// Waived in a dry run. Otherwise an unprivileged user is offered an
    /// elevated relaunch with `relaunch_args`, which carry the same
    /// selection; declining, or giving no answer, continues with a warning.
    pub fn privilege_gate(
        &mut self,
        run: &RunConfiguration,
        relaunch_args: &[String],
        elevation: &dyn Elevation,
        prompter: &mut dyn Prompter,
        log: &dyn Log,
    ) -> Gate {
        if run.dry_run().is_active() {
            log.debug("dry run: privilege check waived");
            return Gate::Proceed;
        }
        if elevation.is_elevated() {
            return Gate::Proceed;
        }

        log.warn(&PreconditionError::NotElevated.to_string());
        let answer = prompter.read_line("Relaunch elevated? [y/N]: ");
        let accepted = answer
            .as_deref()
            .map(str::trim)
            .is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes"));
        if !accepted {
            log.warn("continuing without administrative privileges; some modules may fail");
            return Gate::Proceed;
        }

        match elevation.relaunch(relaunch_args) {
            Ok(()) => {
                log.info("continuing in the elevated process");
                self.phase = Phase::Done;
                Gate::Relaunched
            }
            Err(e) => {
                log.warn(&format!("elevated relaunch failed: {e:#}"));
                log.warn("continuing without administrative privileges; some modules may fail");
                Gate::Proceed
            }
        }
    }

    /// Run every selected module in master order.
    ///
    /// Entry points are validated up front so problems show before anything
    /// changes; an unresolvable module still gets its turn and fails there.
    pub fn run_modules(
        &mut self,
        run: &RunConfiguration,
        registry: &Registry,
        ctx: &Context,
    ) -> RunReport {
        self.phase = Phase::RunningModules;
        for problem in registry.validate(run.selected().iter().copied()) {
            ctx.log.warn(&problem.to_string());
        }

        let mut report = RunReport::new(self.started_at, run.dry_run().is_active());
        let mut handoff = Handoff::default();
        for descriptor in descriptors() {
            if !run.is_selected(descriptor.id) {
                ctx.log.debug(&format!("{} not selected", descriptor.id));
                continue;
            }
            report.push(runner::run(descriptor, registry, ctx, &mut handoff));
        }
        report.finish(Local::now());
        report
    }

    /// Render the summary and, when asked, write the JSON report.
    ///
    /// A JSON write failure is only a warning.
    pub fn report(
        &mut self,
        report: &RunReport,
        log: &dyn Log,
        log_file: Option<&Path>,
        json_path: Option<&Path>,
    ) {
        self.phase = Phase::Reporting;
        report.render(log, log_file);
        if let Some(path) = json_path {
            match report.write_json(path) {
                Ok(()) => log.info(&format!("report: {}", path.display())),
                Err(e) => log.warn(&format!("could not write report: {e:#}")),
            }
        }
        self.phase = Phase::Done;
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use anyhow::Result;

    use super::*;
    use crate::elevation::MockElevation;
    use crate::logging::{Level, MemoryLog};
    use crate::modules::registry::{ModuleId, Toggle};
    use crate::modules::test_helpers::memory_context;
    use crate::modules::{Module, Outcome};
    use crate::platform::Os;
    use crate::report::ModuleStatus;
    use crate::selection::menu::test_helpers::ScriptedPrompter;

    struct Fixed(ModuleId, bool);

    impl Module for Fixed {
        fn id(&self) -> ModuleId {
            self.0
        }

        fn execute(&self, _ctx: &Context, _handoff: &mut Handoff) -> Result<Outcome> {
            if self.1 {
                Ok(Outcome::Ok)
            } else {
                panic!("{} exploded", self.0)
            }
        }
    }

    fn registry_of(ids: &[(ModuleId, bool)]) -> Registry {
        let mut registry = Registry::new();
        for (id, ok) in ids {
            registry.insert(Box::new(Fixed(*id, *ok)));
        }
        registry
    }

    fn real_run(excluded: &[Toggle]) -> RunConfiguration {
        RunConfiguration::new(DryRun::default(), excluded.iter().copied().collect())
    }

    #[test]
    fn dry_run_waives_privilege_gate() {
        let mut elevation = MockElevation::new();
        elevation.expect_is_elevated().never();
        elevation.expect_relaunch().never();
        let run = RunConfiguration::new(DryRun::new(true), BTreeSet::new());
        let gate = Orchestrator::new(Local::now()).privilege_gate(
            &run,
            &run.relaunch_args(),
            &elevation,
            &mut ScriptedPrompter::new(&[]),
            &MemoryLog::new(),
        );
        assert_eq!(gate, Gate::Proceed);
    }

    #[test]
    fn elevated_process_proceeds_without_prompt() {
        let mut elevation = MockElevation::new();
        elevation.expect_is_elevated().return_const(true);
        elevation.expect_relaunch().never();
        let mut prompter = ScriptedPrompter::new(&["y"]);
        let gate = Orchestrator::new(Local::now()).privilege_gate(
            &real_run(&[]),
            &[],
            &elevation,
            &mut prompter,
            &MemoryLog::new(),
        );
        assert_eq!(gate, Gate::Proceed);
    }

    #[test]
    fn accepted_relaunch_carries_selection() {
        let mut elevation = MockElevation::new();
        elevation.expect_is_elevated().return_const(false);
        elevation
            .expect_relaunch()
            .withf(|args| {
                args.iter()
                    .map(String::as_str)
                    .eq(["--skip-drivers", "--skip-wsl", "--no-menu"])
            })
            .times(1)
            .returning(|_| Ok(()));
        let run = real_run(&[Toggle::Wsl, Toggle::Drivers]);
        let mut orchestrator = Orchestrator::new(Local::now());
        let gate = orchestrator.privilege_gate(
            &run,
            &run.relaunch_args(),
            &elevation,
            &mut ScriptedPrompter::new(&["y"]),
            &MemoryLog::new(),
        );
        assert_eq!(gate, Gate::Relaunched);
        assert_eq!(orchestrator.phase(), Phase::Done);
    }

    #[test]
    fn declined_or_missing_answer_continues_with_warning() {
        for answers in [&["n"][..], &[][..]] {
            let mut elevation = MockElevation::new();
            elevation.expect_is_elevated().return_const(false);
            elevation.expect_relaunch().never();
            let log = MemoryLog::new();
            let gate = Orchestrator::new(Local::now()).privilege_gate(
                &real_run(&[]),
                &[],
                &elevation,
                &mut ScriptedPrompter::new(answers),
                &log,
            );
            assert_eq!(gate, Gate::Proceed);
            assert!(log.contains(Level::Warn, "continuing without administrative privileges"));
        }
    }

    #[test]
    fn failed_relaunch_continues() {
        let mut elevation = MockElevation::new();
        elevation.expect_is_elevated().return_const(false);
        elevation
            .expect_relaunch()
            .returning(|_| Err(anyhow::anyhow!("UAC prompt dismissed")));
        let log = MemoryLog::new();
        let gate = Orchestrator::new(Local::now()).privilege_gate(
            &real_run(&[]),
            &[],
            &elevation,
            &mut ScriptedPrompter::new(&["yes"]),
            &log,
        );
        assert_eq!(gate, Gate::Proceed);
        assert!(log.contains(Level::Warn, "UAC prompt dismissed"));
    }

    #[test]
    fn quitting_the_menu_finishes_without_running() {
        let mut orchestrator = Orchestrator::new(Local::now());
        let config = orchestrator.resolve_selection(
            &SelectionInput::default(),
            DryRun::default(),
            &mut ScriptedPrompter::new(&["q"]),
            &MemoryLog::new(),
        );
        assert!(config.is_none());
        assert_eq!(orchestrator.phase(), Phase::Done);
    }

    #[test]
    fn walk_follows_master_order_and_skips_unselected() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        let registry = registry_of(&[
            (ModuleId::Wsl, true),
            (ModuleId::Environment, true),
            (ModuleId::Prerequisites, true),
            (ModuleId::PackageManager, true),
            (ModuleId::Fonts, true),
        ]);
        let run = real_run(&[
            Toggle::Software,
            Toggle::SystemConfig,
            Toggle::Telemetry,
            Toggle::GitConfig,
            Toggle::PowerShell,
            Toggle::Drivers,
        ]);
        let mut orchestrator = Orchestrator::new(Local::now());
        let report = orchestrator.run_modules(&run, &registry, &ctx);
        let ids: Vec<ModuleId> = report.results().iter().map(|r| r.module_id).collect();
        assert_eq!(
            ids,
            vec![
                ModuleId::Prerequisites,
                ModuleId::PackageManager,
                ModuleId::Environment,
                ModuleId::Fonts,
                ModuleId::Wsl,
            ]
        );
        assert_eq!(orchestrator.phase(), Phase::RunningModules);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn total_time_counts_from_run_start() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        let registry = registry_of(&[(ModuleId::Prerequisites, true)]);
        let started = Local::now() - chrono::Duration::seconds(120);
        let report =
            Orchestrator::new(started).run_modules(&real_run(&Toggle::ALL), &registry, &ctx);
        assert!(report.total_seconds() >= 120.0);
        assert!(report.module_seconds() < 120.0);
    }

    #[test]
    fn failures_do_not_stop_the_walk() {
        let (ctx, log) = memory_context(Os::Linux, false);
        let registry = registry_of(&[
            (ModuleId::Prerequisites, false),
            (ModuleId::PackageManager, true),
            (ModuleId::Fonts, true),
        ]);
        let run = real_run(&Toggle::ALL);
        let report = Orchestrator::new(Local::now()).run_modules(&run, &registry, &ctx);
        assert_eq!(report.executed(), 3);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.results()[0].status, ModuleStatus::Failed);
        assert_eq!(report.results()[2].status, ModuleStatus::Ok);
        assert!(log.contains(Level::Error, "prerequisites exploded"));
    }

    #[test]
    fn unregistered_modules_are_reported_up_front() {
        let (ctx, log) = memory_context(Os::Linux, false);
        let run = real_run(&Toggle::ALL);
        let report = Orchestrator::new(Local::now()).run_modules(&run, &Registry::new(), &ctx);
        assert_eq!(report.failed(), 3);
        assert_eq!(log.messages(Level::Warn).len(), 3);
    }

    #[test]
    fn report_phase_and_json_failure_warning() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let log = Arc::new(MemoryLog::new());
        let mut orchestrator = Orchestrator::new(Local::now());
        orchestrator.report(
            &RunReport::new(Local::now(), false),
            log.as_ref(),
            None,
            Some(&blocker.join("report.json")),
        );
        assert_eq!(orchestrator.phase(), Phase::Done);
        assert!(log.contains(Level::Warn, "could not write report"));
    }
}
