//! Resource entries as they appear in a manifest
//!
//! Entries carry only the identifying fields a resource needs; none of
//! them refers to another entry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// The seven kinds of resource a manifest can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    SourceList,
    Package,
    Template,
    PersonalPackageArchive,
    User,
    Service,
    Database,
}

impl ResourceKind {
    /// Every kind, in manifest field order
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::SourceList,
        ResourceKind::Package,
        ResourceKind::Template,
        ResourceKind::PersonalPackageArchive,
        ResourceKind::User,
        ResourceKind::Service,
        ResourceKind::Database,
    ];

    /// Name of the manifest field holding this kind
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::SourceList => "source_lists",
            Self::Package => "packages",
            Self::Template => "templates",
            Self::PersonalPackageArchive => "personal_package_archives",
            Self::User => "users",
            Self::Service => "services",
            Self::Database => "databases",
        }
    }

    /// Short singular label
    pub fn label(&self) -> &'static str {
        match self {
            Self::SourceList => "source_list",
            Self::Package => "package",
            Self::Template => "template",
            Self::PersonalPackageArchive => "ppa",
            Self::User => "user",
            Self::Service => "service",
            Self::Database => "database",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// An apt source list file (`/etc/apt/sources.list.d/<name>.list`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceList {
    /// File name without the `.list` extension
    pub name: String,
    /// File contents, one-line-style apt sources
    pub source: String,
}

impl SourceList {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// A system package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Package {
    pub name: String,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A file rendered from a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Template {
    /// Absolute destination path
    pub path: PathBuf,
    /// Template file; relative paths resolve against the manifest's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Inline template text, alternative to `source`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Values for `{{ name }}` placeholders
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    /// Octal file mode, e.g. "0644"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Template {
    /// Template with inline content
    pub fn inline(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: None,
            content: Some(content.into()),
            variables: BTreeMap::new(),
            mode: None,
        }
    }

    /// Template read from a file
    pub fn from_file(path: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: Some(source.into()),
            content: None,
            variables: BTreeMap::new(),
            mode: None,
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

/// A Launchpad personal package archive, e.g. `ppa:deadsnakes/ppa`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonalPackageArchive {
    pub name: String,
}

impl PersonalPackageArchive {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A local user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Create a system account
    #[serde(default)]
    pub system: bool,
    /// Supplementary groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            home: None,
            shell: None,
            system: false,
            groups: Vec::new(),
        }
    }
}

/// A systemd service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    /// Unit name without the `.service` suffix
    pub name: String,
    /// Command line for `ExecStart`
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Account the service runs as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    /// systemd `Restart=` policy
    #[serde(default = "default_restart")]
    pub restart: String,
}

fn default_restart() -> String {
    "always".to_string()
}

impl Service {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            description: None,
            user: None,
            working_directory: None,
            environment: BTreeMap::new(),
            restart: default_restart(),
        }
    }
}

/// A PostgreSQL database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Database {
    pub name: String,
    /// Role that will own the database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
        }
    }
}
