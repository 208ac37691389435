//! System packages via apt

use anyhow::Result;
use aptkit::{Apt, InstallOutcome};
use declarative::{ApplyContext, ApplyResult, Resource};

use super::require_non_empty;

/// A package installed with `apt-get install`
#[derive(Debug, Clone)]
pub struct PackageResource {
    pub name: String,
}

impl PackageResource {
    pub fn new(name: &str) -> Result<Self> {
        require_non_empty("package name", name)?;
        Ok(Self {
            name: name.trim().to_string(),
        })
    }
}

impl Resource for PackageResource {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("Install {}", self.name)
    }

    fn resource_type(&self) -> &'static str {
        "package"
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let apt = Apt::new(ctx.runner);
        if apt.is_installed(&self.name)? {
            return Ok(ApplyResult::NoChange);
        }
        match apt.install(&self.name)? {
            InstallOutcome::Installed => Ok(ApplyResult::Changed),
            InstallOutcome::AlreadyInstalled => Ok(ApplyResult::NoChange),
        }
    }
}
