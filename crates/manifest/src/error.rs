//! Error types for the manifest crate

use crate::types::ResourceKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating manifests
#[derive(Error, Debug)]
pub enum Error {
    /// Manifest file could not be read
    #[error("failed to read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON syntax or shape error
    #[error("invalid JSON manifest {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// TOML syntax or shape error
    #[error("invalid TOML manifest {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// File extension is neither `.json` nor `.toml`
    #[error("unsupported manifest format: {} (expected .json or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// One or more entries failed validation
    #[error("manifest has {} problem(s):\n{}", .0.len(), .0)]
    Invalid(Issues),
}

/// A single validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: ResourceKind,
    /// Position of the entry within its sequence
    pub index: usize,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {}",
            self.kind.field_name(),
            self.index,
            self.message
        )
    }
}

/// Every validation problem found in a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issues(pub Vec<Issue>);

impl Issues {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, kind: ResourceKind, index: usize, message: impl Into<String>) {
        self.0.push(Issue {
            kind,
            index,
            message: message.into(),
        });
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {issue}")?;
        }
        Ok(())
    }
}

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;
