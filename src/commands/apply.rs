use anyhow::{Context as _, Result};
use chrono::Utc;
use colored::Colorize;
use declarative::ConvergeSummary;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::ApplyArgs;
use crate::engine::{self, Plan};
use crate::progress::ConsoleProgress;
use crate::runner::SystemRunner;
use crate::state::{RunRecord, RunState};
use crate::sudo;
use crate::ui;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let paths = args.manifests.manifests;
    let config = super::load_config(ctx)?;
    let manifest = super::load_manifests(&paths)?;
    let plan = Plan::build(&manifest, &config.layout())?;
    sudo::require_root(args.skip_root_check)?;

    if !ctx.quiet {
        ui::header("Converging host");
        ui::kv("Manifests", &display_paths(&paths));
        ui::kv("Resources", &plan.len().to_string());
    }

    let cache = super::index_cache(&config);
    let mut progress = ConsoleProgress::new(ctx.quiet);
    let started_at = Utc::now();
    let outcome = engine::converge(&plan, &SystemRunner, &cache, &mut progress);
    drop(progress);

    record(&config.state_file(), RunRecord::finished(started_at, &paths, &outcome));

    let summary = outcome?;
    if !ctx.quiet {
        print_summary(&summary);
    }
    Ok(())
}

/// Persist the run; errors are only logged
fn record(path: &Path, run: RunRecord) {
    let result = RunState::load(path).and_then(|mut state| {
        state.record(run);
        state.save(path)
    });
    if let Err(e) = result.context("Failed to record run state") {
        log::warn!("{e:#}");
    }
}

fn print_summary(summary: &ConvergeSummary) {
    println!();
    if summary.changed == 0 {
        ui::success(&format!(
            "Host already converged ({} unchanged)",
            summary.no_change
        ));
    } else {
        ui::success(&format!(
            "Converged: {}, {} unchanged",
            ui::plural(summary.changed, "change").green(),
            summary.no_change
        ));
    }
    if summary.index_refreshes > 0 {
        ui::dim(&format!(
            "Package index refreshed {} time(s)",
            summary.index_refreshes
        ));
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
