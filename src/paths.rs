//! Centralized path resolution for stackform
//!
//! # Environment Variables
//!
//! - `STACKFORM_CONFIG_DIR` - Override config directory
//! - `STACKFORM_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `STACKFORM_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/stackform` (if set)
//! 3. `~/.config/stackform`
//!
//! For state_dir():
//! 1. `STACKFORM_STATE_DIR` environment variable
//! 2. `state_dir` from `config.toml`
//! 3. `/var/lib/stackform`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "STACKFORM_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "STACKFORM_STATE_DIR";

/// State directory used when nothing overrides it
pub const DEFAULT_STATE_DIR: &str = "/var/lib/stackform";

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the stackform config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("stackform");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("stackform");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Path of the config file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Get the stackform state directory path
///
/// `configured` is the `state_dir` value from `config.toml`, if any.
pub fn state_dir(configured: Option<&Path>) -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return path;
    }

    if let Some(dir) = configured {
        let path = expand(&dir.to_string_lossy());
        log::debug!("Using state dir from config: {}", path.display());
        return path;
    }

    log::debug!("Using default state dir: {DEFAULT_STATE_DIR}");
    PathBuf::from(DEFAULT_STATE_DIR)
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    /// Serializes tests that touch process environment variables
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Run `f` with `key` set to `value` (or removed for `None`)
    pub(crate) fn with_env<F, R>(key: &str, value: Option<&str>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original = env::var(key).ok();
        // SAFETY: ENV_LOCK serializes every test that reads or writes these vars
        unsafe {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        let result = f();
        // SAFETY: as above
        unsafe {
            match original {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env(ENV_CONFIG_DIR, Some("/custom/config/path"), || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/config/path"));
            assert_eq!(
                config_file().unwrap(),
                PathBuf::from("/custom/config/path/config.toml")
            );
        });
    }

    #[test]
    fn test_config_dir_env_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        with_env(ENV_CONFIG_DIR, Some("~/dotfiles/stackform-tilde-test"), || {
            assert_eq!(
                config_dir().unwrap(),
                home.join("dotfiles").join("stackform-tilde-test")
            );
        });
    }

    #[test]
    fn test_state_dir_priority() {
        with_env(ENV_STATE_DIR, Some("/custom/state"), || {
            assert_eq!(
                state_dir(Some(Path::new("/from/config"))),
                PathBuf::from("/custom/state")
            );
        });
        with_env(ENV_STATE_DIR, None, || {
            assert_eq!(
                state_dir(Some(Path::new("/from/config"))),
                PathBuf::from("/from/config")
            );
            assert_eq!(state_dir(None), PathBuf::from(DEFAULT_STATE_DIR));
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/test/path"), home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
