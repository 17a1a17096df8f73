//! Runs one module with failure isolation and timing.
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use crate::error::HandOffError;
use crate::modules::registry::{ModuleDescriptor, Registry};
use crate::modules::{Context, Handoff, Outcome};
use crate::report::{FailureKind, ModuleResult};

/// Resolve and execute the module behind `descriptor`.
///
/// Never returns an error and never propagates a panic: every way a module
/// can fail is turned into a failed [`ModuleResult`].
pub fn run(
    descriptor: &ModuleDescriptor,
    registry: &Registry,
    ctx: &Context,
    handoff: &mut Handoff,
) -> ModuleResult {
    let name = descriptor.display_name;
    ctx.log.stage(name);

    let module = match registry.resolve(descriptor.id) {
        Ok(module) => module,
        Err(e) => {
            ctx.log.error(&format!("✗ {name}: {e}"));
            return ModuleResult::failed(
                descriptor,
                FailureKind::Resolution,
                e.to_string(),
                Vec::new(),
                0.0,
            );
        }
    };

    let start = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| module.execute(ctx, handoff)));
    let elapsed = start.elapsed().as_secs_f64();
    let intents = ctx.take_intents();
    let summary = ctx.take_summary();

    match outcome {
        Ok(Ok(outcome)) => {
            match &outcome {
                Outcome::Skipped(reason) => {
                    ctx.log.info(&format!("○ {name}: skipped ({reason})"));
                }
                Outcome::Ok | Outcome::DryRun => {
                    ctx.log.info(&format!("✓ {name} ({elapsed:.1}s)"));
                }
            }
            ModuleResult::completed(descriptor, outcome, elapsed, summary, intents)
        }
        Ok(Err(e)) => {
            let kind = if e
                .chain()
                .any(|cause| cause.downcast_ref::<HandOffError>().is_some())
            {
                FailureKind::HandOff
            } else {
                FailureKind::Execution
            };
            ctx.log.error(&format!("✗ {name} ({elapsed:.1}s): {e:#}"));
            let trace = e.chain().skip(1).map(ToString::to_string).collect();
            ModuleResult::failed(descriptor, kind, e.to_string(), trace, elapsed)
                .with_intents(intents)
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            let detail = format!("module panicked: {message}");
            ctx.log.error(&format!("✗ {name} ({elapsed:.1}s): {detail}"));
            ModuleResult::failed(descriptor, FailureKind::Fault, detail, Vec::new(), elapsed)
                .with_intents(intents)
        }
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
    use anyhow::{Context as _, Result};

    use super::*;
    use crate::logging::{Level, MemoryLog};
    use crate::modules::Module;
    use crate::modules::registry::{MASTER, ModuleId};
    use crate::modules::test_helpers::memory_context;
    use crate::platform::Os;
    use crate::report::ModuleStatus;

    enum Behaviour {
        Succeed,
        Skip,
        Fail,
        HandOff,
        Panic,
        DryRunIntent,
    }

    struct Scripted(ModuleId, Behaviour);

    impl Module for Scripted {
        fn id(&self) -> ModuleId {
            self.0
        }

        fn execute(&self, ctx: &Context, _: &mut Handoff) -> Result<Outcome> {
            match self.1 {
                Behaviour::Succeed => {
                    ctx.set_summary("1 changed, 0 already ok".to_string());
                    Ok(Outcome::Ok)
                }
                Behaviour::Skip => Ok(Outcome::Skipped("nothing to do".to_string())),
                Behaviour::Fail => Err(anyhow::anyhow!("disk full")).context("writing profile"),
                Behaviour::HandOff => Err(HandOffError::MissingArtifact("/x/hardware.json".into()))
                    .context("loading hardware report"),
                Behaviour::Panic => panic!("boom"),
                Behaviour::DryRunIntent => {
                    ctx.record_intent("would set EDITOR=nvim");
                    Ok(Outcome::DryRun)
                }
            }
        }
    }

    fn descriptor(id: ModuleId) -> &'static ModuleDescriptor {
        MASTER.iter().find(|d| d.id == id).unwrap()
    }

    fn run_one(behaviour: Behaviour) -> (ModuleResult, std::sync::Arc<MemoryLog>) {
        let (ctx, log) = memory_context(Os::Linux, false);
        let mut registry = Registry::new();
        registry.insert(Box::new(Scripted(ModuleId::Environment, behaviour)));
        let result = run(
            descriptor(ModuleId::Environment),
            &registry,
            &ctx,
            &mut Handoff::default(),
        );
        (result, log)
    }

    #[test]
    fn success_carries_summary() {
        let (result, log) = run_one(Behaviour::Succeed);
        assert_eq!(result.status, ModuleStatus::Ok);
        assert!(result.succeeded);
        assert_eq!(result.note.as_deref(), Some("1 changed, 0 already ok"));
        assert!(log.contains(Level::Stage, "Configure environment variables"));
        assert!(log.contains(Level::Info, "✓ Configure environment variables"));
    }

    #[test]
    fn skip_is_success_with_reason() {
        let (result, _) = run_one(Behaviour::Skip);
        assert_eq!(result.status, ModuleStatus::Skipped);
        assert!(result.succeeded);
        assert_eq!(result.note.as_deref(), Some("nothing to do"));
    }

    #[test]
    fn error_becomes_execution_failure_with_trace() {
        let (result, log) = run_one(Behaviour::Fail);
        assert!(!result.succeeded);
        assert_eq!(result.failure_kind, Some(FailureKind::Execution));
        assert_eq!(result.error_detail.as_deref(), Some("writing profile"));
        assert_eq!(result.trace, vec!["disk full"]);
        assert!(log.contains(Level::Error, "writing profile: disk full"));
    }

    #[test]
    fn hand_off_error_is_classified() {
        let (result, _) = run_one(Behaviour::HandOff);
        assert_eq!(result.failure_kind, Some(FailureKind::HandOff));
    }

    #[test]
    fn panic_is_contained() {
        let (result, _) = run_one(Behaviour::Panic);
        assert_eq!(result.status, ModuleStatus::Failed);
        assert_eq!(result.failure_kind, Some(FailureKind::Fault));
        assert_eq!(result.error_detail.as_deref(), Some("module panicked: boom"));
    }

    #[test]
    fn intents_attached_to_result() {
        let (result, _) = run_one(Behaviour::DryRunIntent);
        assert_eq!(result.status, ModuleStatus::DryRun);
        assert_eq!(result.intents, vec!["would set EDITOR=nvim"]);
    }

    #[test]
    fn unresolved_module_is_not_invoked() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        let result = run(
            descriptor(ModuleId::Wsl),
            &Registry::new(),
            &ctx,
            &mut Handoff::default(),
        );
        assert_eq!(result.failure_kind, Some(FailureKind::Resolution));
        assert!(result.duration_seconds.abs() < f64::EPSILON);
        assert_eq!(
            result.error_detail.as_deref(),
            Some("no entry point registered for module 'wsl'")
        );
    }
}
