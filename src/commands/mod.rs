pub mod analyze;
pub mod apply;
pub mod plan;
pub mod refresh;
pub mod status;
pub mod validate;

use anyhow::{Context as _, Result};
use declarative::{IndexCache, MarkerFileStore};
use manifest::Manifest;
use std::path::PathBuf;

use crate::Context;
use crate::config::StackformConfig;

/// Load the config named on the command line, or the default one
pub fn load_config(ctx: &Context) -> Result<StackformConfig> {
    StackformConfig::load(ctx.config.as_deref())
}

/// Load and merge manifests in argument order
pub fn load_manifests(paths: &[PathBuf]) -> Result<Manifest> {
    let manifest = Manifest::load_all(paths).context("Failed to load manifests")?;
    log::info!(
        "Loaded {} from {} file(s)",
        crate::ui::plural(manifest.len(), "entry"),
        paths.len()
    );
    Ok(manifest)
}

/// Freshness cache backed by the configured marker file
pub fn index_cache(config: &StackformConfig) -> IndexCache<MarkerFileStore> {
    IndexCache::new(
        MarkerFileStore::new(config.marker_path()),
        config.marker_policy,
    )
}
