//! Concrete resources for a Debian/Ubuntu host
//!
//! Each manifest entry becomes one [`declarative::Resource`]. Construction
//! validates the entry's own preconditions, so an invalid manifest is
//! rejected before anything on the host is touched. Everything a resource
//! knows about its tool's output lives in its own module.

pub mod database;
pub mod package;
pub mod ppa;
pub mod service;
pub mod source_list;
pub mod template;
pub mod user;

pub use database::DatabaseResource;
pub use package::PackageResource;
pub use ppa::PpaResource;
pub use service::ServiceResource;
pub use source_list::SourceListResource;
pub use template::TemplateResource;
pub use user::UserResource;

use anyhow::{Result, bail};
use std::io;
use std::path::{Path, PathBuf};

/// Host locations and accounts the resources work against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLayout {
    /// apt sources directory, e.g. `/etc/apt/sources.list.d`
    pub sources_dir: PathBuf,
    /// systemd unit directory, e.g. `/etc/systemd/system`
    pub unit_dir: PathBuf,
    /// Package providing `add-apt-repository`
    pub ppa_support_package: String,
    /// Account `createdb` runs as
    pub postgres_user: String,
}

/// Whether a tool reported that the thing it was asked to create exists
pub fn reports_already_exists(output: &str) -> bool {
    output.trim_end().ends_with("already exists")
}

/// Reject empty identifying fields
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} must not be empty");
    }
    Ok(())
}

/// Reject names that cannot be used as a plain file name
pub(crate) fn require_file_stem(field: &str, value: &str) -> Result<()> {
    require_non_empty(field, value)?;
    if value.contains('/') || value.contains(char::is_whitespace) || value.starts_with('.') {
        bail!("{field} '{value}' is not a plain file name");
    }
    Ok(())
}

/// Read a file, `None` if it does not exist
pub(crate) fn read_existing(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
