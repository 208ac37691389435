//! Local user accounts via `useradd`

use anyhow::{Result, bail};
use declarative::{ApplyContext, ApplyResult, CommandError, Resource};
use std::path::PathBuf;

use super::{reports_already_exists, require_non_empty};

/// A local user account
#[derive(Debug, Clone)]
pub struct UserResource {
    pub name: String,
    pub home: Option<PathBuf>,
    pub shell: Option<String>,
    pub system: bool,
    pub groups: Vec<String>,
}

impl UserResource {
    pub fn from_entry(entry: &manifest::User) -> Result<Self> {
        require_non_empty("user name", &entry.name)?;
        if entry.name.contains([':', '/']) || entry.name.contains(char::is_whitespace) {
            bail!("invalid user name '{}'", entry.name);
        }
        Ok(Self {
            name: entry.name.clone(),
            home: entry.home.clone(),
            shell: entry.shell.clone(),
            system: entry.system,
            groups: entry.groups.clone(),
        })
    }

    fn useradd_args(&self) -> Vec<String> {
        let mut args = vec!["--create-home".to_string()];
        if self.system {
            args.push("--system".to_string());
        }
        if let Some(home) = &self.home {
            args.push("--home-dir".to_string());
            args.push(home.display().to_string());
        }
        if let Some(shell) = &self.shell {
            args.push("--shell".to_string());
            args.push(shell.clone());
        }
        if !self.groups.is_empty() {
            args.push("--groups".to_string());
            args.push(self.groups.join(","));
        }
        args.push(self.name.clone());
        args
    }
}

impl Resource for UserResource {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("Ensure user {}", self.name)
    }

    fn resource_type(&self) -> &'static str {
        "user"
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.run("id", &["-u", &self.name])?.success {
            return Ok(ApplyResult::NoChange);
        }

        let args = self.useradd_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = ctx.run("useradd", &args)?;
        if output.success {
            Ok(ApplyResult::Changed)
        } else if reports_already_exists(&output.combined()) {
            Ok(ApplyResult::NoChange)
        } else {
            Err(CommandError::new("useradd", &args, &output).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_host::FakeHost;

    fn deploy() -> manifest::User {
        let mut user = manifest::User::new("deploy");
        user.shell = Some("/bin/bash".to_string());
        user.groups = vec!["www-data".to_string(), "adm".to_string()];
        user
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert!(UserResource::from_entry(&manifest::User::new("")).is_err());
        assert!(UserResource::from_entry(&manifest::User::new("bad:name")).is_err());
    }

    #[test]
    fn test_creates_missing_user() {
        let host = FakeHost::new();
        let user = UserResource::from_entry(&deploy()).unwrap();
        let mut ctx = ApplyContext::new(&host);

        assert_eq!(user.apply(&mut ctx).unwrap(), ApplyResult::Changed);
        assert!(host.has_user("deploy"));
        assert!(host.commands().contains(
            &"useradd --create-home --shell /bin/bash --groups www-data,adm deploy".to_string()
        ));

        assert_eq!(user.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
    }

    #[test]
    fn test_already_exists_output_is_no_change() {
        let host = FakeHost::new();
        host.script("id -u deploy", declarative::CommandOutput::failed(1, "id: 'deploy': no such user\n"));
        host.add_user("deploy");
        let user = UserResource::from_entry(&deploy()).unwrap();

        assert_eq!(
            user.apply(&mut ApplyContext::new(&host)).unwrap(),
            ApplyResult::NoChange
        );
    }

    #[test]
    fn test_other_failure_is_error() {
        let host = FakeHost::new();
        host.script(
            "useradd --create-home --shell /bin/bash --groups www-data,adm deploy",
            declarative::CommandOutput::failed(6, "useradd: group 'www-data' does not exist\n"),
        );
        let user = UserResource::from_entry(&deploy()).unwrap();
        let err = user.apply(&mut ApplyContext::new(&host)).unwrap_err();
        assert!(err.to_string().contains("group 'www-data' does not exist"));
    }
}
