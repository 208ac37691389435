//! systemd services
//!
//! The unit file is rendered into the unit directory. A changed unit is
//! followed by `daemon-reload`, and a running service is restarted so the
//! new definition takes effect.

use anyhow::{Context, Result, bail};
use declarative::{ApplyContext, ApplyResult, Resource};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::{read_existing, require_file_stem, require_non_empty};

const SYSTEMCTL: &str = "systemctl";

/// A systemd service unit that should be enabled and running
#[derive(Debug, Clone)]
pub struct ServiceResource {
    pub name: String,
    pub unit_path: PathBuf,
    unit: String,
}

impl ServiceResource {
    pub fn new(entry: &manifest::Service, unit_dir: &Path) -> Result<Self> {
        require_file_stem("service name", &entry.name)?;
        require_non_empty("service command", &entry.command)?;
        for (field, value) in unit_fields(entry) {
            if value.contains(['\n', '\r']) {
                bail!("service '{}' {field} must be a single line", entry.name);
            }
        }
        Ok(Self {
            name: entry.name.clone(),
            unit_path: unit_dir.join(format!("{}.service", entry.name)),
            unit: render_unit(entry),
        })
    }

    /// Unit name as systemctl knows it
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.name)
    }

    /// Write the unit file; returns whether it changed
    fn write_unit(&self) -> Result<bool> {
        let existing = read_existing(&self.unit_path)
            .with_context(|| format!("Failed to read {}", self.unit_path.display()))?;
        if existing.as_deref() == Some(self.unit.as_str()) {
            return Ok(false);
        }
        if let Some(dir) = self.unit_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(&self.unit_path, &self.unit)
            .with_context(|| format!("Failed to write {}", self.unit_path.display()))?;
        Ok(true)
    }
}

impl Resource for ServiceResource {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("Run service {}", self.name)
    }

    fn resource_type(&self) -> &'static str {
        "service"
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let unit = self.unit_name();
        let unit_changed = self.write_unit()?;
        if unit_changed {
            ctx.run_checked(SYSTEMCTL, &["daemon-reload"])?;
        }

        let enabled = ctx.run(SYSTEMCTL, &["is-enabled", "--quiet", &unit])?.success;
        let active = ctx.run(SYSTEMCTL, &["is-active", "--quiet", &unit])?.success;

        if unit_changed && active {
            ctx.run_checked(SYSTEMCTL, &["restart", &unit])?;
        }
        if !enabled || !active {
            ctx.run_checked(SYSTEMCTL, &["enable", "--now", &unit])?;
            return Ok(ApplyResult::Changed);
        }
        Ok(ApplyResult::from_changed(unit_changed))
    }
}

/// Every value written into the unit file, labelled for error messages
fn unit_fields(entry: &manifest::Service) -> Vec<(String, String)> {
    let mut fields = vec![
        ("command".to_string(), entry.command.clone()),
        ("restart".to_string(), entry.restart.clone()),
    ];
    if let Some(description) = &entry.description {
        fields.push(("description".to_string(), description.clone()));
    }
    if let Some(user) = &entry.user {
        fields.push(("user".to_string(), user.clone()));
    }
    if let Some(dir) = &entry.working_directory {
        fields.push((
            "working_directory".to_string(),
            dir.to_string_lossy().into_owned(),
        ));
    }
    for (key, value) in &entry.environment {
        fields.push(("environment key".to_string(), key.clone()));
        fields.push((format!("environment value for {key}"), value.clone()));
    }
    fields
}

fn render_unit(entry: &manifest::Service) -> String {
    let mut unit = String::new();
    let description = entry.description.as_deref().unwrap_or(&entry.name);

    let _ = writeln!(unit, "[Unit]");
    let _ = writeln!(unit, "Description={description}");
    let _ = writeln!(unit, "After=network.target");
    let _ = writeln!(unit);
    let _ = writeln!(unit, "[Service]");
    let _ = writeln!(unit, "ExecStart={}", entry.command.trim());
    let _ = writeln!(unit, "Restart={}", entry.restart);
    if let Some(user) = &entry.user {
        let _ = writeln!(unit, "User={user}");
    }
    if let Some(dir) = &entry.working_directory {
        let _ = writeln!(unit, "WorkingDirectory={}", dir.display());
    }
    for (key, value) in &entry.environment {
        let _ = writeln!(unit, "Environment=\"{key}={}\"", value.replace('"', "\\\""));
    }
    let _ = writeln!(unit);
    let _ = writeln!(unit, "[Install]");
    let _ = writeln!(unit, "WantedBy=multi-user.target");
    unit
}
