use anyhow::Result;
use colored::Colorize;
use declarative::Freshness;

use crate::Context;
use crate::runner;
use crate::state::{RunRecord, RunState};
use crate::sudo;
use crate::ui;

/// Tools the resources shell out to
const HOST_TOOLS: [&str; 6] = [
    "apt-get",
    "dpkg-query",
    "add-apt-repository",
    "useradd",
    "systemctl",
    "createdb",
];

pub fn run(ctx: &Context) -> Result<()> {
    let config = super::load_config(ctx)?;
    let state = RunState::load(&config.state_file())?;
    let freshness = super::index_cache(&config).freshness()?;

    ui::header("stackform status");

    ui::section("Last run");
    match &state.last_run {
        Some(run) => show_run(run),
        None => ui::dim("No recorded run. Run: stackform apply <MANIFEST>"),
    }
    if let Some(at) = state.last_success {
        ui::kv("Last success", &at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    }

    ui::section("Package index");
    ui::kv("Marker", &config.marker_path().display().to_string());
    ui::kv("Freshness", &freshness_label(freshness));

    ui::section("Host");
    let privileges = if sudo::is_root() {
        "root".green().to_string()
    } else {
        format!("uid {} (apply and refresh need root)", sudo::effective_uid())
            .yellow()
            .to_string()
    };
    ui::kv("Privileges", &privileges);
    for tool in HOST_TOOLS {
        let mark = if runner::command_exists(tool) {
            "✓".green()
        } else {
            "✗".yellow()
        };
        println!("  {mark} {tool}");
    }

    println!();
    Ok(())
}

fn show_run(run: &RunRecord) {
    let outcome = if run.succeeded() {
        "succeeded".green()
    } else {
        "failed".red()
    };
    ui::kv("Outcome", &outcome.to_string());
    ui::kv(
        "Finished",
        &run.finished_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    let elapsed = run.finished_at - run.started_at;
    ui::kv("Duration", &format!("{}s", elapsed.num_seconds()));
    for path in &run.manifests {
        ui::kv("Manifest", &path.display().to_string());
    }
    ui::kv(
        "Resources",
        &format!(
            "{} changed, {} unchanged, {} index refresh(es)",
            run.changed, run.unchanged, run.index_refreshes
        ),
    );
    if let Some(error) = &run.error {
        ui::kv("Error", &error.red().to_string());
        ui::warn("The run stopped at the first failure; later resources were not visited");
    }
}

fn freshness_label(freshness: Freshness) -> String {
    match freshness {
        Freshness::Fresh { .. } => freshness.describe().green().to_string(),
        Freshness::Stale { .. } | Freshness::Missing => {
            format!("{} (next apply refreshes)", freshness.describe().yellow())
        }
    }
}
