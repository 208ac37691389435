use anyhow::Result;
use colored::Colorize;
use declarative::Freshness;

use crate::Context;
use crate::cli::ManifestArgs;
use crate::engine::{CONVERGE_STEPS, Plan, Step};
use crate::ui;

/// What a step will do, as far as can be told without touching the host
#[derive(Debug, PartialEq, Eq)]
enum StepOutlook {
    /// Nothing declared for this step
    Skip,
    /// Depends on what earlier steps change
    Maybe,
    Run(Vec<String>),
}

fn outlook(plan: &Plan, step: Step, freshness: Freshness) -> StepOutlook {
    match step {
        Step::RefreshIndex if freshness.needs_refresh() => {
            StepOutlook::Run(vec![format!("refresh ({})", freshness.describe())])
        }
        Step::RefreshIndex => StepOutlook::Skip,
        Step::ForceRefresh if plan.source_lists.is_empty() && plan.ppas.is_empty() => {
            StepOutlook::Skip
        }
        Step::ForceRefresh => StepOutlook::Maybe,
        _ => {
            let resources = plan.resources(step);
            if resources.is_empty() {
                StepOutlook::Skip
            } else {
                StepOutlook::Run(resources.iter().map(|r| r.description()).collect())
            }
        }
    }
}

pub fn run(ctx: &Context, args: ManifestArgs) -> Result<()> {
    let config = super::load_config(ctx)?;
    let manifest = super::load_manifests(&args.manifests)?;
    let plan = Plan::build(&manifest, &config.layout())?;
    let freshness = super::index_cache(&config).freshness()?;

    ui::header("Plan");
    ui::kv("Resources", &plan.len().to_string());
    ui::kv("Package index", &freshness.describe());

    for (i, step) in CONVERGE_STEPS.iter().enumerate() {
        println!();
        let title = step.name().replace('_', " ");
        match outlook(&plan, *step, freshness) {
            StepOutlook::Skip => {
                println!("{} {}", format!("[{}]", i + 1).dimmed(), title.dimmed());
            }
            StepOutlook::Maybe => {
                ui::step(i + 1, CONVERGE_STEPS.len(), &title);
                ui::dim(step.condition().unwrap_or_default());
            }
            StepOutlook::Run(lines) => {
                ui::step(i + 1, CONVERGE_STEPS.len(), &title);
                for line in lines {
                    println!("  {} {}", "•".cyan(), line);
                }
            }
        }
    }
    Ok(())
}
