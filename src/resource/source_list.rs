//! apt source list files

use anyhow::{Context, Result};
use declarative::{ApplyContext, ApplyResult, Resource};
use std::fs;
use std::path::{Path, PathBuf};

use super::{read_existing, require_file_stem};

/// `<sources_dir>/<name>.list` with fixed contents
#[derive(Debug, Clone)]
pub struct SourceListResource {
    pub name: String,
    pub path: PathBuf,
    content: String,
}

impl SourceListResource {
    pub fn new(entry: &manifest::SourceList, sources_dir: &Path) -> Result<Self> {
        require_file_stem("source list name", &entry.name)?;
        let entries = aptkit::sources::parse_string(&entry.source)
            .with_context(|| format!("invalid source for source list '{}'", entry.name))?;
        if entries.is_empty() {
            anyhow::bail!("source list '{}' has no entries", entry.name);
        }

        let mut content = entry.source.trim_end().to_string();
        content.push('\n');
        Ok(Self {
            name: entry.name.clone(),
            path: sources_dir.join(format!("{}.list", entry.name)),
            content,
        })
    }
}

impl Resource for SourceListResource {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("Write {}", self.path.display())
    }

    fn resource_type(&self) -> &'static str {
        "source_list"
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let existing = read_existing(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if existing.as_deref() == Some(self.content.as_str()) {
            return Ok(ApplyResult::NoChange);
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(&self.path, &self.content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(ApplyResult::Changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_host::FakeHost;
    use tempfile::TempDir;

    const PGDG: &str = "deb http://apt.postgresql.org/pub/repos/apt jammy-pgdg main";

    #[test]
    fn test_validation() {
        let dir = Path::new("/etc/apt/sources.list.d");
        assert!(SourceListResource::new(&manifest::SourceList::new("", PGDG), dir).is_err());
        assert!(SourceListResource::new(&manifest::SourceList::new("pgdg", "# nothing\n"), dir).is_err());
        assert!(SourceListResource::new(&manifest::SourceList::new("pgdg", "rpm http://x y z"), dir).is_err());
    }

    #[test]
    fn test_write_then_no_change() {
        let temp = TempDir::new().unwrap();
        let sources = temp.path().join("sources.list.d");
        let list = SourceListResource::new(&manifest::SourceList::new("pgdg", PGDG), &sources).unwrap();
        let host = FakeHost::new();
        let mut ctx = ApplyContext::new(&host);

        assert_eq!(list.apply(&mut ctx).unwrap(), ApplyResult::Changed);
        assert_eq!(
            fs::read_to_string(sources.join("pgdg.list")).unwrap(),
            format!("{PGDG}\n")
        );
        assert_eq!(list.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_different_content_is_rewritten() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pgdg.list"), "deb http://old jammy main\n").unwrap();
        let list = SourceListResource::new(&manifest::SourceList::new("pgdg", PGDG), temp.path()).unwrap();

        let host = FakeHost::new();
        assert_eq!(
            list.apply(&mut ApplyContext::new(&host)).unwrap(),
            ApplyResult::Changed
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("pgdg.list")).unwrap(),
            format!("{PGDG}\n")
        );
    }
}
