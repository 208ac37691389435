use anyhow::{Context as _, Result};
use aptkit::Apt;

use crate::Context;
use crate::cli::RefreshArgs;
use crate::progress;
use crate::runner::SystemRunner;
use crate::sudo;
use crate::ui;

/// Refresh the package index and mark it refreshed, regardless of age
pub fn run(ctx: &Context, args: RefreshArgs) -> Result<()> {
    sudo::require_root(args.skip_root_check)?;
    let config = super::load_config(ctx)?;
    let cache = super::index_cache(&config);
    cache.prepare()?;

    let apt = Apt::new(&SystemRunner);
    let spinner = (!ctx.quiet).then(|| progress::spinner("Refreshing package index"));
    let result = cache
        .refresh_and_mark(&apt)
        .context("Failed to refresh the package index");
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    result?;

    if !ctx.quiet {
        ui::success("Package index refreshed");
        ui::kv("Marker", &config.marker_path().display().to_string());
    }
    Ok(())
}
