//! PostgreSQL databases via `createdb`

use anyhow::{Result, bail};
use declarative::{ApplyContext, ApplyResult, CommandError, Resource};

use super::reports_already_exists;
use crate::sudo;

/// Longest identifier PostgreSQL keeps without truncation, in bytes
const MAX_IDENTIFIER_LEN: usize = 63;

/// A database created with `createdb`, run as the PostgreSQL account
#[derive(Debug, Clone)]
pub struct DatabaseResource {
    pub name: String,
    pub owner: Option<String>,
    postgres_user: String,
}

impl DatabaseResource {
    pub fn new(entry: &manifest::Database, postgres_user: &str) -> Result<Self> {
        if !is_identifier(&entry.name) {
            bail!(
                "database name '{}' is not a valid PostgreSQL identifier \
                 (1-{MAX_IDENTIFIER_LEN} bytes, no NUL, must not start with '-')",
                entry.name
            );
        }
        if let Some(owner) = entry.owner.as_deref().filter(|o| !is_identifier(o)) {
            bail!("database owner '{owner}' is not a valid PostgreSQL identifier");
        }
        Ok(Self {
            name: entry.name.clone(),
            owner: entry.owner.clone(),
            postgres_user: postgres_user.to_string(),
        })
    }
}

/// Name `createdb` accepts as a single argument
///
/// `createdb` quotes names itself, so any text PostgreSQL keeps as an
/// identifier works. A leading `-` would be read as an option.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_IDENTIFIER_LEN
        && !name.contains('\0')
        && !name.starts_with('-')
}

impl Resource for DatabaseResource {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("Create database {}", self.name)
    }

    fn resource_type(&self) -> &'static str {
        "database"
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let mut createdb = Vec::new();
        if let Some(owner) = &self.owner {
            createdb.extend(["--owner", owner.as_str()]);
        }
        createdb.push(self.name.as_str());
        let args = sudo::as_user(&self.postgres_user, "createdb", &createdb);

        let output = ctx.run("sudo", &args)?;
        // createdb exits non-zero for an existing database; the message decides
        if reports_already_exists(&output.combined()) {
            return Ok(ApplyResult::NoChange);
        }
        if output.success {
            Ok(ApplyResult::Changed)
        } else {
            Err(CommandError::new("sudo", &args, &output).into())
        }
    }
}
