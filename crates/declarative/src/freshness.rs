//! Package index freshness
//!
//! Refreshing the system package index is a host-wide side effect that is
//! slow and rarely needed. The cache here decides whether a refresh is due
//! from a single persisted timestamp and a fixed freshness window:
//!
//! - never refreshed → refresh now
//! - refreshed at least [`FRESHNESS_WINDOW_DAYS`] ago → stale, refresh
//! - refreshed more recently → fresh, skip
//!
//! The timestamp lives behind [`FreshnessStore`] and "now" behind [`Clock`],
//! so the policy can be exercised without touching real file times.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// Age at which the package index is considered stale
pub const FRESHNESS_WINDOW_DAYS: i64 = 7;

/// Something that can refresh the package index
pub trait IndexRefresher {
    /// Refresh the index, failing with the tool's output on error
    fn refresh(&self) -> Result<()>;
}

/// Persisted "last refreshed" timestamp
pub trait FreshnessStore {
    /// Make sure the store can be written (e.g. create its directory)
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// When the index was last marked refreshed, `None` if never
    fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>>;

    /// Record a refresh at the given time
    fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<()>;
}

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// When the marker is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerPolicy {
    /// Write the marker after every successful time-based refresh
    #[default]
    Touch,
    /// Create the marker (before refreshing) only when it is missing;
    /// a stale marker keeps its old timestamp
    CreateOnly,
}

/// Observed state of the package index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Never refreshed
    Missing,
    /// Refreshed too long ago
    Stale { age: Duration },
    /// Refreshed within the window
    Fresh { age: Duration },
}

impl Freshness {
    /// Whether a time-based refresh is due
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Self::Fresh { .. })
    }

    /// Short human readable description
    pub fn describe(&self) -> String {
        match self {
            Self::Missing => "never refreshed".to_string(),
            Self::Stale { age } => format!("stale ({})", format_age(*age)),
            Self::Fresh { age } => format!("fresh ({})", format_age(*age)),
        }
    }
}

fn format_age(age: Duration) -> String {
    if age.num_days() > 0 {
        format!("{}d old", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h old", age.num_hours())
    } else {
        format!("{}m old", age.num_minutes().max(0))
    }
}

/// Time-windowed gate in front of the package index refresh
pub struct IndexCache<S, C = SystemClock> {
    store: S,
    clock: C,
    policy: MarkerPolicy,
    window: Duration,
}

impl<S: FreshnessStore> IndexCache<S, SystemClock> {
    /// Cache backed by the wall clock
    pub fn new(store: S, policy: MarkerPolicy) -> Self {
        Self::with_clock(store, SystemClock, policy)
    }
}

impl<S: FreshnessStore, C: Clock> IndexCache<S, C> {
    /// Cache with an injected clock
    pub fn with_clock(store: S, clock: C, policy: MarkerPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            window: Duration::days(FRESHNESS_WINDOW_DAYS),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> MarkerPolicy {
        self.policy
    }

    /// Prepare the underlying store; done before anything is applied
    pub fn prepare(&self) -> Result<()> {
        self.store.prepare()
    }

    /// Classify the index without changing anything
    pub fn freshness(&self) -> Result<Freshness> {
        let Some(last) = self.store.last_refreshed()? else {
            return Ok(Freshness::Missing);
        };
        let age = self.clock.now() - last;
        if age >= self.window {
            Ok(Freshness::Stale { age })
        } else {
            Ok(Freshness::Fresh { age })
        }
    }

    /// Refresh the index if it is missing or stale
    ///
    /// Returns the freshness observed before any refresh.
    pub fn ensure_fresh(&self, refresher: &dyn IndexRefresher) -> Result<Freshness> {
        let freshness = self.freshness()?;
        match (freshness, self.policy) {
            (Freshness::Fresh { .. }, _) => {
                log::info!("Package index is {}, skipping refresh", freshness.describe());
            }
            (Freshness::Missing, MarkerPolicy::CreateOnly) => {
                self.store.mark_refreshed(self.clock.now())?;
                log::info!("Package index never refreshed, refreshing");
                refresher.refresh()?;
            }
            (Freshness::Stale { .. }, MarkerPolicy::CreateOnly) => {
                log::info!("Package index is {}, refreshing", freshness.describe());
                refresher.refresh()?;
            }
            (_, MarkerPolicy::Touch) => {
                log::info!("Package index is {}, refreshing", freshness.describe());
                refresher.refresh()?;
                self.store.mark_refreshed(self.clock.now())?;
            }
        }
        Ok(freshness)
    }

    /// Refresh unconditionally, leaving the marker alone
    pub fn force_refresh(&self, refresher: &dyn IndexRefresher) -> Result<()> {
        log::info!("Refreshing package index");
        refresher.refresh()
    }

    /// Refresh unconditionally and record it
    pub fn refresh_and_mark(&self, refresher: &dyn IndexRefresher) -> Result<()> {
        refresher.refresh()?;
        self.store.mark_refreshed(self.clock.now())
    }
}

/// Store backed by the modification time of a zero-byte marker file
#[derive(Debug, Clone)]
pub struct MarkerFileStore {
    path: PathBuf,
}

impl MarkerFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FreshnessStore for MarkerFileStore {
    fn prepare(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }
        Ok(())
    }

    fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read marker file: {}", self.path.display())
                });
            }
        };
        let modified = metadata
            .modified()
            .with_context(|| format!("No modification time for {}", self.path.display()))?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }

    fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<()> {
        self.prepare()?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("Failed to create marker file: {}", self.path.display()))?;
        file.set_modified(SystemTime::from(at))
            .with_context(|| format!("Failed to touch marker file: {}", self.path.display()))?;
        log::debug!("Marked package index refreshed at {}", at);
        Ok(())
    }
}

/// In-memory store, mostly useful for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new(last: Option<DateTime<Utc>>) -> Self {
        Self {
            last: Mutex::new(last),
        }
    }
}

impl FreshnessStore for MemoryStore {
    fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>> {
        let last = self
            .last
            .lock()
            .map_err(|_| anyhow::anyhow!("freshness store lock poisoned"))?;
        Ok(*last)
    }

    fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<()> {
        let mut last = self
            .last
            .lock()
            .map_err(|_| anyhow::anyhow!("freshness store lock poisoned"))?;
        *last = Some(at);
        Ok(())
    }
}

impl<S: FreshnessStore + ?Sized> FreshnessStore for &S {
    fn prepare(&self) -> Result<()> {
        (**self).prepare()
    }

    fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>> {
        (**self).last_refreshed()
    }

    fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<()> {
        (**self).mark_refreshed(at)
    }
}
