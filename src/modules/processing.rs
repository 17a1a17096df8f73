//! Generic resource processing loop: check state, apply, collect stats.
//!
//! This is the single place where resource mutations happen, so it is also
//! where dry-run is enforced: a resource that needs a change gets an intent
//! record instead of an [`apply`](Resource::apply) call.

use anyhow::Result;

use super::{Context, Outcome};
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Counters for modules that process many items.
///
/// Provides consistent summary logging across all modules.
///
/// # Examples
///
/// ```
/// use provision_cli::modules::ModuleStats;
///
/// let mut stats = ModuleStats::new();
/// stats.changed = 3;
/// stats.already_ok = 10;
///
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 10 already ok");
/// ```
///
/// When items are skipped, the summary includes the count:
///
/// ```
/// use provision_cli::modules::ModuleStats;
///
/// let stats = ModuleStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModuleStats {
    /// Number of items changed or applied.
    pub changed: u32,
    /// Number of items already in the correct state.
    pub already_ok: u32,
    /// Number of items skipped due to errors or inapplicability.
    pub skipped: u32,
}

impl ModuleStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary, store it on the context and return the matching
    /// [`Outcome`].
    #[must_use]
    pub fn finish(self, ctx: &Context) -> Outcome {
        let summary = self.summary(ctx.is_dry_run());
        ctx.log.info(&summary);
        ctx.set_summary(summary);
        if ctx.is_dry_run() {
            Outcome::DryRun
        } else {
            Outcome::Ok
        }
    }
}

impl std::ops::AddAssign for ModuleStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

/// Configuration for the generic resource processing loop.
///
/// # Examples
///
/// ```
/// use provision_cli::modules::ProcessOpts;
///
/// // Fix everything, bail on errors (strict):
/// let opts = ProcessOpts::apply_all("set");
/// assert!(opts.fix_incorrect && opts.bail_on_error);
///
/// // Install only missing resources, warn on errors:
/// let opts = ProcessOpts::install_missing("install");
/// assert!(!opts.fix_incorrect && !opts.bail_on_error);
/// ```
#[derive(Debug)]
pub struct ProcessOpts<'a> {
    /// Verb for log messages (e.g., "install", "set", "disable").
    pub verb: &'a str,
    /// Treat `Incorrect` as fixable (apply the change). If `false`, skip it.
    pub fix_incorrect: bool,
    /// Propagate errors from `apply()` (bail). If `false`, warn and count as skipped.
    pub bail_on_error: bool,
}

impl<'a> ProcessOpts<'a> {
    /// Fix both missing and incorrect resources, bailing on errors.
    #[must_use]
    pub const fn apply_all(verb: &'a str) -> Self {
        Self {
            verb,
            fix_incorrect: true,
            bail_on_error: true,
        }
    }

    /// Install only missing resources, warning on errors instead of bailing.
    #[must_use]
    pub const fn install_missing(verb: &'a str) -> Self {
        Self {
            verb,
            fix_incorrect: false,
            bail_on_error: false,
        }
    }

    /// Warn on errors instead of bailing.
    #[must_use]
    pub const fn no_bail(mut self) -> Self {
        self.bail_on_error = false;
        self
    }
}

/// Process resources by checking each one's current state and applying as needed.
///
/// # Errors
///
/// Returns an error if a state check fails, or if an apply fails while
/// `opts.bail_on_error` is set.
pub fn process_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts,
) -> Result<Outcome> {
    Ok(resource_stats(ctx, resources, opts)?.finish(ctx))
}

/// Like [`process_resources`] but returns the counters without finishing,
/// for modules that process several kinds of resource.
///
/// # Errors
///
/// Same as [`process_resources`].
pub fn resource_stats<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts,
) -> Result<ModuleStats> {
    let mut stats = ModuleStats::new();
    for resource in resources {
        let current = resource.current_state()?;
        stats += process_single(ctx, &resource, current, opts)?;
    }
    Ok(stats)
}

/// Process resources with pre-computed states.
///
/// For modules that batch-query state (installed packages, font listing)
/// and then iterate with cached results.
///
/// # Errors
///
/// Returns an error if an apply fails while `opts.bail_on_error` is set.
pub fn process_resource_states<R: Resource>(
    ctx: &Context,
    resource_states: impl IntoIterator<Item = (R, ResourceState)>,
    opts: &ProcessOpts,
) -> Result<Outcome> {
    let mut stats = ModuleStats::new();
    for (resource, current) in resource_states {
        stats += process_single(ctx, &resource, current, opts)?;
    }
    Ok(stats.finish(ctx))
}

/// Process a single resource given its current state, returning a stats delta.
fn process_single<R: Resource>(
    ctx: &Context,
    resource: &R,
    state: ResourceState,
    opts: &ProcessOpts,
) -> Result<ModuleStats> {
    let desc = resource.description();
    let mut delta = ModuleStats::new();
    match state {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceState::Invalid { reason } => {
            ctx.log.debug(&format!("skipping {desc}: {reason}"));
            delta.skipped += 1;
        }
        ResourceState::Incorrect { .. } if !opts.fix_incorrect => {
            ctx.log
                .debug(&format!("skipping {desc} (unexpected state)"));
            delta.skipped += 1;
        }
        state @ (ResourceState::Missing | ResourceState::Incorrect { .. }) => {
            if ctx.is_dry_run() {
                let intent = if let ResourceState::Incorrect { ref current } = state {
                    format!("would {} {desc} (currently {current})", opts.verb)
                } else {
                    format!("would {}: {desc}", opts.verb)
                };
                ctx.record_intent(&intent);
                delta.changed += 1;
                return Ok(delta);
            }
            delta += apply_resource(ctx, resource, opts)?;
        }
    }
    Ok(delta)
}

/// Apply a single resource change, returning a stats delta.
fn apply_resource<R: Resource>(
    ctx: &Context,
    resource: &R,
    opts: &ProcessOpts,
) -> Result<ModuleStats> {
    let desc = resource.description();
    let mut delta = ModuleStats::new();
    let change = match resource.apply() {
        Ok(change) => change,
        Err(e) => {
            if opts.bail_on_error {
                return Err(e.context(format!("failed to {} {desc}", opts.verb)));
            }
            ctx.log
                .warn(&format!("failed to {} {desc}: {e:#}", opts.verb));
            delta.skipped += 1;
            return Ok(delta);
        }
    };

    match change {
        ResourceChange::Applied => {
            ctx.log.info(&format!("{}: {desc}", opts.verb));
            delta.changed += 1;
        }
        ResourceChange::AlreadyCorrect => {
            delta.already_ok += 1;
        }
        ResourceChange::Skipped { reason } => {
            if opts.bail_on_error {
                anyhow::bail!("failed to {} {desc}: {reason}", opts.verb);
            }
            ctx.log
                .warn(&format!("failed to {} {desc}: {reason}", opts.verb));
            delta.skipped += 1;
        }
    }
    Ok(delta)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::Level;
    use crate::modules::test_helpers::memory_context;
    use crate::platform::Os;
    use std::cell::Cell;

    /// A configurable mock resource for testing the processing pipeline.
    struct MockResource {
        state: ResourceState,
        apply_result: Result<ResourceChange, String>,
        applied: Cell<bool>,
    }

    impl MockResource {
        fn new(state: ResourceState) -> Self {
            Self {
                state,
                apply_result: Ok(ResourceChange::Applied),
                applied: Cell::new(false),
            }
        }

        fn with_apply(mut self, result: Result<ResourceChange, String>) -> Self {
            self.apply_result = result;
            self
        }
    }

    impl Resource for MockResource {
        fn description(&self) -> String {
            "mock resource".to_string()
        }

        fn current_state(&self) -> Result<ResourceState> {
            Ok(self.state.clone())
        }

        fn apply(&self) -> Result<ResourceChange> {
            self.applied.set(true);
            self.apply_result
                .clone()
                .map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    fn incorrect() -> ResourceState {
        ResourceState::Incorrect {
            current: "old".to_string(),
        }
    }

    #[test]
    fn stats_summary_dry_run() {
        let stats = ModuleStats {
            changed: 2,
            already_ok: 1,
            skipped: 0,
        };
        assert_eq!(stats.summary(true), "2 would change, 1 already ok");
    }

    #[test]
    fn finish_returns_outcome_and_stores_summary() {
        let (ctx, _log) = memory_context(Os::Linux, true);
        assert!(matches!(ModuleStats::new().finish(&ctx), Outcome::DryRun));
        assert_eq!(
            ctx.take_summary().as_deref(),
            Some("0 would change, 0 already ok")
        );

        let (ctx, _log) = memory_context(Os::Linux, false);
        assert!(matches!(ModuleStats::new().finish(&ctx), Outcome::Ok));
    }

    #[test]
    fn correct_and_invalid_are_not_applied() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        let ok = MockResource::new(ResourceState::Correct);
        let invalid = MockResource::new(ResourceState::Invalid {
            reason: "n/a".to_string(),
        });
        let delta = process_single(&ctx, &ok, ok.state.clone(), &ProcessOpts::apply_all("set"))
            .unwrap();
        assert_eq!(delta.already_ok, 1);
        let delta = process_single(
            &ctx,
            &invalid,
            invalid.state.clone(),
            &ProcessOpts::apply_all("set"),
        )
        .unwrap();
        assert_eq!(delta.skipped, 1);
        assert!(!ok.applied.get() && !invalid.applied.get());
    }

    #[test]
    fn missing_is_applied() {
        let (ctx, log) = memory_context(Os::Linux, false);
        let res = MockResource::new(ResourceState::Missing);
        let delta = process_single(
            &ctx,
            &res,
            ResourceState::Missing,
            &ProcessOpts::apply_all("install"),
        )
        .unwrap();
        assert_eq!(delta.changed, 1);
        assert!(res.applied.get());
        assert!(log.contains(Level::Info, "install: mock resource"));
    }

    #[test]
    fn incorrect_skipped_when_not_fixing() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        let res = MockResource::new(incorrect());
        let delta = process_single(
            &ctx,
            &res,
            incorrect(),
            &ProcessOpts::install_missing("install"),
        )
        .unwrap();
        assert_eq!(delta.skipped, 1);
        assert!(!res.applied.get());
    }

    #[test]
    fn dry_run_records_intent_without_applying() {
        let (ctx, log) = memory_context(Os::Linux, true);
        let missing = MockResource::new(ResourceState::Missing);
        let wrong = MockResource::new(incorrect());
        let outcome = process_resources(
            &ctx,
            [missing, wrong],
            &ProcessOpts::apply_all("set"),
        )
        .unwrap();
        assert!(matches!(outcome, Outcome::DryRun));
        assert_eq!(
            ctx.take_intents(),
            vec![
                "would set: mock resource",
                "would set mock resource (currently old)"
            ]
        );
        assert_eq!(log.messages(Level::DryRun).len(), 2);
    }

    #[test]
    fn apply_error_bails_with_context() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        let res = MockResource::new(ResourceState::Missing).with_apply(Err("boom".to_string()));
        let err = apply_resource(&ctx, &res, &ProcessOpts::apply_all("set")).unwrap_err();
        assert_eq!(format!("{err:#}"), "failed to set mock resource: boom");
    }

    #[test]
    fn apply_error_without_bail_warns() {
        let (ctx, log) = memory_context(Os::Linux, false);
        let res = MockResource::new(ResourceState::Missing).with_apply(Err("boom".to_string()));
        let delta =
            apply_resource(&ctx, &res, &ProcessOpts::apply_all("set").no_bail()).unwrap();
        assert_eq!(delta.skipped, 1);
        assert!(log.contains(Level::Warn, "boom"));
    }

    #[test]
    fn skipped_change_bails_when_strict() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        let res = MockResource::new(ResourceState::Missing).with_apply(Ok(
            ResourceChange::Skipped {
                reason: "installer exited 1".to_string(),
            },
        ));
        assert!(apply_resource(&ctx, &res, &ProcessOpts::apply_all("install")).is_err());
        let delta =
            apply_resource(&ctx, &res, &ProcessOpts::install_missing("install")).unwrap();
        assert_eq!(delta.skipped, 1);
    }

    #[test]
    fn process_resource_states_uses_cached_state() {
        let (ctx, _log) = memory_context(Os::Linux, false);
        // current_state would say Missing, but the cached state wins.
        let res = MockResource::new(ResourceState::Missing);
        let outcome = process_resource_states(
            &ctx,
            [(res, ResourceState::Correct)],
            &ProcessOpts::apply_all("install"),
        )
        .unwrap();
        assert!(matches!(outcome, Outcome::Ok));
        assert_eq!(
            ctx.take_summary().as_deref(),
            Some("0 changed, 1 already ok")
        );
    }
}
