use anyhow::Result;
use colored::Colorize;
use manifest::ResourceKind;

use crate::Context;
use crate::cli::ManifestArgs;
use crate::engine::Plan;
use crate::ui;

pub fn run(ctx: &Context, args: ManifestArgs) -> Result<()> {
    let config = super::load_config(ctx)?;
    let manifest = super::load_manifests(&args.manifests)?;
    // Building the plan runs every check that apply would, without the host
    Plan::build(&manifest, &config.layout())?;

    if ctx.quiet {
        return Ok(());
    }
    ui::header("Manifest");
    for kind in ResourceKind::ALL {
        let count = manifest.count(kind);
        let value = if count == 0 {
            count.to_string().dimmed().to_string()
        } else {
            count.to_string()
        };
        ui::kv(kind.field_name(), &value);
    }
    println!();
    ui::success(&format!(
        "Valid: {}",
        ui::plural(manifest.len(), "resource")
    ));
    Ok(())
}
