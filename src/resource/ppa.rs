//! Launchpad personal package archives

use anyhow::{Context, Result};
use aptkit::{Apt, Ppa};
use declarative::{ApplyContext, ApplyResult, Resource};
use std::path::{Path, PathBuf};

/// A PPA registered with `add-apt-repository`
#[derive(Debug, Clone)]
pub struct PpaResource {
    pub ppa: Ppa,
    sources_dir: PathBuf,
}

impl PpaResource {
    pub fn new(entry: &manifest::PersonalPackageArchive, sources_dir: &Path) -> Result<Self> {
        Ok(Self {
            ppa: Ppa::parse(&entry.name)?,
            sources_dir: sources_dir.to_path_buf(),
        })
    }
}

impl Resource for PpaResource {
    fn id(&self) -> String {
        self.ppa.to_string()
    }

    fn description(&self) -> String {
        format!("Add {}", self.ppa)
    }

    fn resource_type(&self) -> &'static str {
        "ppa"
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let registered = aptkit::find_ppa(&self.sources_dir, &self.ppa)
            .with_context(|| format!("Failed to scan {}", self.sources_dir.display()))?;
        if let Some(path) = registered {
            log::debug!("{} already registered in {}", self.ppa, path.display());
            return Ok(ApplyResult::NoChange);
        }
        Apt::new(ctx.runner).add_ppa(&self.ppa)?;
        Ok(ApplyResult::Changed)
    }
}
