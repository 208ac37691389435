use anyhow::{Context as _, Result};
use aptkit::{Ppa, SourceFile};
use manifest::{PersonalPackageArchive, SourceList};
use serde::Serialize;
use std::path::Path;

use crate::Context;
use crate::cli::AnalyzeArgs;

/// Manifest fragment describing the apt sources already on a host
#[derive(Debug, Default, Serialize)]
pub struct SourcesFragment {
    pub source_lists: Vec<SourceList>,
    pub personal_package_archives: Vec<PersonalPackageArchive>,
}

impl SourcesFragment {
    fn add_ppa(&mut self, ppa: &Ppa) {
        let name = ppa.to_string();
        if !self.personal_package_archives.iter().any(|p| p.name == name) {
            self.personal_package_archives
                .push(PersonalPackageArchive::new(name));
        }
    }

    fn add_file(&mut self, file: &SourceFile) {
        if !file.is_list() {
            // deb822: only PPAs are recognized, by their URIs
            let ppas: Vec<Ppa> = file
                .content
                .lines()
                .filter_map(|line| line.trim().strip_prefix("URIs:"))
                .flat_map(str::split_whitespace)
                .filter_map(Ppa::from_uri)
                .collect();
            if ppas.is_empty() {
                log::warn!("Skipping {}: not a PPA", file.path.display());
            }
            for ppa in &ppas {
                self.add_ppa(ppa);
            }
            return;
        }

        let entries = match file.entries() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Skipping {}: {e}", file.path.display());
                return;
            }
        };
        if entries.is_empty() {
            return;
        }

        let ppas: Option<Vec<Ppa>> = entries.iter().map(aptkit::SourceEntry::ppa).collect();
        match ppas {
            Some(ppas) => ppas.iter().for_each(|ppa| self.add_ppa(ppa)),
            None => self.source_lists.push(SourceList::new(
                file.name.clone(),
                format!("{}\n", file.content.trim()),
            )),
        }
    }
}

/// Read a sources directory into a fragment
///
/// A `.list` file whose every entry points at a PPA becomes a
/// `personal_package_archives` entry; any other `.list` file is kept
/// verbatim as a `source_lists` entry.
pub fn analyze_dir(dir: &Path) -> Result<SourcesFragment> {
    let files = aptkit::list_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    let mut fragment = SourcesFragment::default();
    for file in &files {
        fragment.add_file(file);
    }
    Ok(fragment)
}

pub fn run(ctx: &Context, args: AnalyzeArgs) -> Result<()> {
    let dir = match args.sources_dir {
        Some(dir) => dir,
        None => super::load_config(ctx)?.layout().sources_dir,
    };
    log::info!("Analyzing {}", dir.display());
    let fragment = analyze_dir(&dir)?;
    let json = serde_json::to_string_pretty(&fragment).context("Failed to serialize fragment")?;
    println!("{json}");
    Ok(())
}
