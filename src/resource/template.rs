//! Files rendered from templates
//!
//! Placeholders are `{{ name }}`; every placeholder must have a value.

use anyhow::{Context, Result, bail};
use declarative::{ApplyContext, ApplyResult, Resource};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use super::read_existing;

const PLACEHOLDER: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

/// Where the template text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateBody {
    Inline(String),
    File(PathBuf),
}

/// A file at an absolute path rendered from a template
#[derive(Debug, Clone)]
pub struct TemplateResource {
    pub path: PathBuf,
    pub body: TemplateBody,
    pub variables: BTreeMap<String, String>,
    /// Permission bits applied on write
    pub mode: Option<u32>,
}

impl TemplateResource {
    pub fn from_entry(entry: &manifest::Template) -> Result<Self> {
        if !entry.path.is_absolute() {
            bail!(
                "template destination {} must be absolute",
                entry.path.display()
            );
        }
        let body = match (&entry.source, &entry.content) {
            (Some(source), None) => TemplateBody::File(source.clone()),
            (None, Some(content)) => TemplateBody::Inline(content.clone()),
            _ => bail!(
                "template {} needs exactly one of `source` or `content`",
                entry.path.display()
            ),
        };
        let mode = entry.mode.as_deref().map(parse_mode).transpose()?;
        Ok(Self {
            path: entry.path.clone(),
            body,
            variables: entry.variables.clone(),
            mode,
        })
    }

    fn load_body(&self) -> Result<String> {
        match &self.body {
            TemplateBody::Inline(text) => Ok(text.clone()),
            TemplateBody::File(source) => fs::read_to_string(source)
                .with_context(|| format!("Failed to read template {}", source.display())),
        }
    }

    /// Render the template with its variables
    pub fn render(&self) -> Result<String> {
        render(&self.load_body()?, &self.variables)
    }

    #[cfg(unix)]
    fn mode_differs(&self) -> Result<bool> {
        use std::os::unix::fs::PermissionsExt;
        let Some(mode) = self.mode else {
            return Ok(false);
        };
        let current = fs::metadata(&self.path)
            .with_context(|| format!("Failed to stat {}", self.path.display()))?
            .permissions()
            .mode();
        Ok(current & 0o7777 != mode)
    }

    #[cfg(not(unix))]
    fn mode_differs(&self) -> Result<bool> {
        Ok(false)
    }

    #[cfg(unix)]
    fn apply_mode(&self) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = self.mode {
            fs::set_permissions(&self.path, fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to chmod {}", self.path.display()))?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply_mode(&self) -> Result<()> {
        Ok(())
    }
}

impl Resource for TemplateResource {
    fn id(&self) -> String {
        self.path.display().to_string()
    }

    fn description(&self) -> String {
        format!("Render {}", self.path.display())
    }

    fn resource_type(&self) -> &'static str {
        "template"
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let rendered = self.render()?;
        let existing = read_existing(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        if existing.as_deref() == Some(rendered.as_str()) {
            if !self.mode_differs()? {
                return Ok(ApplyResult::NoChange);
            }
            self.apply_mode()?;
            return Ok(ApplyResult::Changed);
        }

        if log::log_enabled!(log::Level::Debug) {
            log_diff(&self.id(), existing.as_deref().unwrap_or(""), &rendered);
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(&self.path, &rendered)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        self.apply_mode()?;
        Ok(ApplyResult::Changed)
    }
}

/// Substitute `{{ name }}` placeholders
pub fn render(text: &str, variables: &BTreeMap<String, String>) -> Result<String> {
    let pattern = Regex::new(PLACEHOLDER).context("invalid placeholder pattern")?;

    let missing: BTreeSet<&str> = pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str())
        .filter(|name| !variables.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        bail!(
            "undefined template variable(s): {}",
            missing.into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    let rendered = pattern.replace_all(text, |caps: &regex::Captures| {
        variables
            .get(&caps[1])
            .cloned()
            .unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

/// Parse an octal mode string such as `0644` or `755`
pub fn parse_mode(mode: &str) -> Result<u32> {
    let value = u32::from_str_radix(mode.trim(), 8)
        .with_context(|| format!("invalid file mode '{mode}' (expected octal, e.g. 0644)"))?;
    if value > 0o7777 {
        bail!("file mode '{mode}' is out of range");
    }
    Ok(value)
}

fn log_diff(id: &str, old: &str, new: &str) {
    let diff = similar::TextDiff::from_lines(old, new);
    let body = diff
        .unified_diff()
        .context_radius(3)
        .header("current", "rendered")
        .to_string();
    log::debug!("template {id} changes:\n{body}");
}
