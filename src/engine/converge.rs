//! Single-pass, fail-fast convergence

use anyhow::{Context, Result};
use aptkit::Apt;
use declarative::{
    ApplyContext, ApplyResult, BoxedResource, Clock, CommandRunner, ConvergeSummary,
    FreshnessStore, IndexCache, IndexRefresher, ProgressCallback, apply_in_order,
};
use std::cell::Cell;

use super::{Plan, Step};

/// Counts successful refreshes of the real refresher
struct CountingRefresher<'a> {
    inner: &'a dyn IndexRefresher,
    count: Cell<usize>,
}

impl<'a> CountingRefresher<'a> {
    fn new(inner: &'a dyn IndexRefresher) -> Self {
        Self {
            inner,
            count: Cell::new(0),
        }
    }
}

impl IndexRefresher for CountingRefresher<'_> {
    fn refresh(&self) -> Result<()> {
        self.inner.refresh()?;
        self.count.set(self.count.get() + 1);
        Ok(())
    }
}

/// Forwards progress while tallying resource outcomes
struct Tally<'p> {
    inner: &'p mut dyn ProgressCallback,
    summary: ConvergeSummary,
}

impl ProgressCallback for Tally<'_> {
    fn on_phase_start(&mut self, phase: &str, count: usize) {
        self.inner.on_phase_start(phase, count);
    }

    fn on_resource_start(&mut self, id: &str, description: &str) {
        self.inner.on_resource_start(id, description);
    }

    fn on_resource_complete(&mut self, id: &str, result: ApplyResult) {
        self.summary.add_result(result);
        self.inner.on_resource_complete(id, result);
    }

    fn on_index_refresh(&mut self, reason: &str) {
        self.inner.on_index_refresh(reason);
    }
}

/// Apply every resource of one step
fn run_step(
    step: Step,
    resources: &[BoxedResource],
    ctx: &mut ApplyContext,
    progress: &mut dyn ProgressCallback,
) -> Result<bool> {
    progress.on_phase_start(step.name(), resources.len());
    apply_in_order(resources, ctx, progress)
}

/// Source lists, then the PPA prerequisite, then PPAs
///
/// Returns whether any source list or PPA changed. The prerequisite
/// package does not count: installing it adds no repository.
fn apply_repositories(
    plan: &Plan,
    ctx: &mut ApplyContext,
    progress: &mut dyn ProgressCallback,
) -> Result<bool> {
    let lists_changed = run_step(Step::SourceLists, &plan.source_lists, ctx, progress)?;
    if !plan.ppas.is_empty() {
        run_step(
            Step::PpaSupport,
            plan.resources(Step::PpaSupport),
            ctx,
            progress,
        )?;
    }
    let ppas_changed = run_step(Step::PersonalPackageArchives, &plan.ppas, ctx, progress)?;
    Ok(lists_changed || ppas_changed)
}

/// Converge the host toward the plan
///
/// Steps run in the order of [`super::CONVERGE_STEPS`]. The first error
/// aborts the run; nothing is retried or rolled back. The state directory
/// behind `cache` is prepared before any resource is applied.
pub fn converge<S: FreshnessStore, C: Clock>(
    plan: &Plan,
    runner: &dyn CommandRunner,
    cache: &IndexCache<S, C>,
    progress: &mut dyn ProgressCallback,
) -> Result<ConvergeSummary> {
    cache
        .prepare()
        .context("Failed to prepare the state directory")?;

    let apt = Apt::new(runner);
    let refresher = CountingRefresher::new(&apt);
    let mut ctx = ApplyContext::new(runner);
    let mut tally = Tally {
        inner: progress,
        summary: ConvergeSummary::default(),
    };

    run_step(Step::Users, &plan.users, &mut ctx, &mut tally)?;

    tally.on_phase_start(Step::RefreshIndex.name(), 1);
    let freshness = cache.freshness()?;
    if freshness.needs_refresh() {
        tally.on_index_refresh(&freshness.describe());
    }
    cache
        .ensure_fresh(&refresher)
        .context("Failed to refresh the package index")?;

    if apply_repositories(plan, &mut ctx, &mut tally)? {
        tally.on_phase_start(Step::ForceRefresh.name(), 1);
        tally.on_index_refresh("repositories changed");
        cache
            .force_refresh(&refresher)
            .context("Failed to refresh the package index after adding repositories")?;
    }

    for step in [
        Step::Packages,
        Step::Templates,
        Step::Services,
        Step::Databases,
    ] {
        run_step(step, plan.resources(step), &mut ctx, &mut tally)?;
    }

    let mut summary = tally.summary;
    summary.index_refreshes = refresher.count.get();
    log::info!(
        "Converged: {} changed, {} unchanged, {} index refresh(es)",
        summary.changed,
        summary.no_change,
        summary.index_refreshes
    );
    Ok(summary)
}
