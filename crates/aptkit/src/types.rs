//! Core types for apt package management.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hosts that serve Launchpad personal package archives.
pub const PPA_HOSTS: [&str; 2] = ["ppa.launchpad.net", "ppa.launchpadcontent.net"];

/// A Launchpad personal package archive (`ppa:owner/archive`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ppa {
    /// Launchpad user or team owning the archive
    pub owner: String,
    /// Archive name within the owner's namespace
    pub archive: String,
}

impl Ppa {
    /// Create a PPA reference from its parts.
    pub fn new(owner: impl Into<String>, archive: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            archive: archive.into(),
        }
    }

    /// Parse `ppa:owner/archive`; a bare `ppa:owner` means archive `ppa`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPpa(s.to_string());
        let rest = s.trim().strip_prefix("ppa:").ok_or_else(invalid)?;
        let (owner, archive) = rest.split_once('/').unwrap_or((rest, "ppa"));
        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
        };
        if !valid(owner) || !valid(archive) {
            return Err(invalid());
        }
        Ok(Self::new(owner, archive))
    }

    /// Path of this archive below a PPA host, e.g. `deadsnakes/ppa/ubuntu`.
    pub fn repository_path(&self) -> String {
        format!("{}/{}/ubuntu", self.owner, self.archive)
    }

    /// Whether a sources file body references this archive.
    pub fn matches_source(&self, text: &str) -> bool {
        let path = self.repository_path();
        PPA_HOSTS
            .iter()
            .any(|host| text.contains(&format!("{host}/{path}")))
    }

    /// Recover the PPA from a source URI, if it points at a PPA host.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let without_scheme = uri.split_once("://").map_or(uri, |(_, rest)| rest);
        let (host, path) = without_scheme.split_once('/')?;
        if !PPA_HOSTS.contains(&host) {
            return None;
        }
        let mut parts = path.trim_end_matches('/').split('/');
        let owner = parts.next().filter(|p| !p.is_empty())?;
        let archive = parts.next().filter(|p| !p.is_empty())?;
        Some(Self::new(owner, archive))
    }
}

impl fmt::Display for Ppa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ppa:{}/{}", self.owner, self.archive)
    }
}

impl FromStr for Ppa {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Kind of a one-line sources entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    /// Binary packages (`deb`)
    Deb,
    /// Source packages (`deb-src`)
    DebSrc,
}

impl EntryKind {
    /// The keyword that starts the line.
    pub fn keyword(&self) -> &'static str {
        match self {
            EntryKind::Deb => "deb",
            EntryKind::DebSrc => "deb-src",
        }
    }
}

/// One line of a `.list` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// `deb` or `deb-src`
    pub kind: EntryKind,
    /// Bracketed options, e.g. `arch=amd64 signed-by=/usr/share/keyrings/x.gpg`
    pub options: Vec<String>,
    /// Archive root
    pub uri: String,
    /// Distribution or exact path
    pub suite: String,
    /// Components; empty when `suite` is an exact path
    pub components: Vec<String>,
}

impl SourceEntry {
    /// The PPA this entry points at, if any.
    pub fn ppa(&self) -> Option<Ppa> {
        Ppa::from_uri(&self.uri)
    }
}

impl fmt::Display for SourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.keyword())?;
        if !self.options.is_empty() {
            write!(f, " [{}]", self.options.join(" "))?;
        }
        write!(f, " {} {}", self.uri, self.suite)?;
        for component in &self.components {
            write!(f, " {component}")?;
        }
        Ok(())
    }
}

/// Result of an install request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// apt installed the package
    Installed,
    /// apt reported nothing to do
    AlreadyInstalled,
}

impl InstallOutcome {
    /// Whether the system was modified.
    pub fn is_change(&self) -> bool {
        matches!(self, InstallOutcome::Installed)
    }
}
