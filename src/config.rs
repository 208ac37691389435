//! `config.toml` loading
//!
//! Every key is optional; a missing file means defaults throughout.

use anyhow::{Context, Result};
use declarative::MarkerPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::resource::HostLayout;

/// Default package that provides `add-apt-repository`
pub const DEFAULT_PPA_SUPPORT_PACKAGE: &str = "software-properties-common";

/// Default apt sources directory
pub const DEFAULT_SOURCES_DIR: &str = "/etc/apt/sources.list.d";

/// Default systemd unit directory
pub const DEFAULT_UNIT_DIR: &str = "/etc/systemd/system";

/// Default PostgreSQL superuser account
pub const DEFAULT_POSTGRES_USER: &str = "postgres";

/// User configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackformConfig {
    /// Where the refresh marker and run state live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    /// When the package-index marker is written
    pub marker_policy: MarkerPolicy,

    /// Package installed before any PPA is added
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppa_support_package: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres_user: Option<String>,
}

impl StackformConfig {
    /// Load from an explicit file, or from the config directory
    ///
    /// A missing default file yields defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = paths::config_file()?;
                if !path.exists() {
                    log::debug!("No config at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                Self::load_from(&path)
            }
        }
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolved state directory
    pub fn state_dir(&self) -> PathBuf {
        paths::state_dir(self.state_dir.as_deref())
    }

    /// Path of the package-index refresh marker
    pub fn marker_path(&self) -> PathBuf {
        self.state_dir().join("apt-update")
    }

    /// Path of the run state file
    pub fn state_file(&self) -> PathBuf {
        self.state_dir().join("state.toml")
    }

    /// Host locations and accounts the resources work against
    pub fn layout(&self) -> HostLayout {
        HostLayout {
            sources_dir: self
                .sources_dir
                .as_deref()
                .map(|p| paths::expand(&p.to_string_lossy()))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCES_DIR)),
            unit_dir: self
                .unit_dir
                .as_deref()
                .map(|p| paths::expand(&p.to_string_lossy()))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UNIT_DIR)),
            ppa_support_package: self
                .ppa_support_package
                .clone()
                .unwrap_or_else(|| DEFAULT_PPA_SUPPORT_PACKAGE.to_string()),
            postgres_user: self
                .postgres_user
                .clone()
                .unwrap_or_else(|| DEFAULT_POSTGRES_USER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::tests::with_env;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StackformConfig::default();
        assert_eq!(config.marker_policy, MarkerPolicy::Touch);

        let layout = config.layout();
        assert_eq!(layout.sources_dir, PathBuf::from(DEFAULT_SOURCES_DIR));
        assert_eq!(layout.unit_dir, PathBuf::from(DEFAULT_UNIT_DIR));
        assert_eq!(layout.ppa_support_package, "software-properties-common");
        assert_eq!(layout.postgres_user, "postgres");
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
state_dir = "/srv/stackform"
marker_policy = "create-only"
ppa_support_package = "python-software-properties"
sources_dir = "/tmp/sources"
"#,
        )
        .unwrap();

        let config = StackformConfig::load(Some(&path)).unwrap();
        assert_eq!(config.marker_policy, MarkerPolicy::CreateOnly);
        assert_eq!(config.layout().ppa_support_package, "python-software-properties");
        assert_eq!(config.layout().sources_dir, PathBuf::from("/tmp/sources"));

        with_env(crate::paths::ENV_STATE_DIR, None, || {
            assert_eq!(
                config.marker_path(),
                PathBuf::from("/srv/stackform/apt-update")
            );
            assert_eq!(
                config.state_file(),
                PathBuf::from("/srv/stackform/state.toml")
            );
        });
    }

    #[test]
    fn test_unknown_key_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "state_directory = \"/x\"\n").unwrap();
        assert!(StackformConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(StackformConfig::load(Some(&temp.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_missing_default_file_is_default() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_string_lossy().to_string();
        let config = with_env(crate::paths::ENV_CONFIG_DIR, Some(dir.as_str()), || {
            StackformConfig::load(None).unwrap()
        });
        assert_eq!(config, StackformConfig::default());
    }
}
