use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::ConvergeSummary;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// State Structures
// ============================================================================

/// Persisted record of past runs (`<state_dir>/state.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Most recent `apply`, successful or not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<RunRecord>,

    /// Most recent successful `apply`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
}

/// Outcome of a single `apply`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Manifest files, in merge order
    #[serde(default)]
    pub manifests: Vec<PathBuf>,

    #[serde(default)]
    pub changed: usize,

    #[serde(default)]
    pub unchanged: usize,

    /// Package index refreshes performed
    #[serde(default)]
    pub index_refreshes: usize,

    /// Error that aborted the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    /// Record for a run that finished now
    pub fn finished(
        started_at: DateTime<Utc>,
        manifests: &[PathBuf],
        outcome: &Result<ConvergeSummary>,
    ) -> Self {
        let (summary, error) = match outcome {
            Ok(summary) => (summary.clone(), None),
            Err(e) => (ConvergeSummary::default(), Some(format!("{e:#}"))),
        };
        Self {
            started_at,
            finished_at: Utc::now(),
            manifests: manifests.to_vec(),
            changed: summary.changed,
            unchanged: summary.no_change,
            index_refreshes: summary.index_refreshes,
            error,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

// ============================================================================
// RunState Implementation
// ============================================================================

impl RunState {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: RunState = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create state directory: {}", dir.display())
            })?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Replace the last run, tracking the last success
    pub fn record(&mut self, run: RunRecord) {
        if run.succeeded() {
            self.last_success = Some(run.finished_at);
        }
        self.last_run = Some(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_default() {
        let temp = TempDir::new().unwrap();
        let state = RunState::load(&temp.path().join("state.toml")).unwrap();
        assert!(state.last_run.is_none());
        assert!(state.last_success.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("state.toml");

        let summary = ConvergeSummary {
            changed: 3,
            no_change: 9,
            index_refreshes: 1,
        };
        let run = RunRecord::finished(
            Utc::now(),
            &[PathBuf::from("/srv/base.toml"), PathBuf::from("/srv/web.json")],
            &Ok(summary),
        );

        let mut state = RunState::default();
        state.record(run.clone());
        state.save(&path).unwrap();

        let loaded = RunState::load(&path).unwrap();
        assert_eq!(loaded.last_run, Some(run));
        assert!(loaded.last_success.is_some());
    }

    #[test]
    fn test_failed_run_keeps_last_success() {
        let mut state = RunState::default();
        state.record(RunRecord::finished(
            Utc::now(),
            &[],
            &Ok(ConvergeSummary::default()),
        ));
        let success = state.last_success;

        let failed = RunRecord::finished(
            Utc::now(),
            &[],
            &Err(anyhow::anyhow!("apt-get install failed").context("failed to apply package 'nope'")),
        );
        state.record(failed);

        let last = state.last_run.as_ref().unwrap();
        assert!(!last.succeeded());
        assert_eq!(
            last.error.as_deref(),
            Some("failed to apply package 'nope': apt-get install failed")
        );
        assert_eq!(state.last_success, success);
    }
}
