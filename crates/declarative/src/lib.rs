//! # Declarative
//!
//! A small framework for declarative, idempotent host configuration.
//!
//! ## Core Concepts
//!
//! - **Resource**: one declared unit of desired state with an idempotent `apply`
//! - **ApplyResult**: `Changed` or `NoChange`, never an error for "already there"
//! - **CommandRunner**: the only way resources reach OS tooling
//! - **IndexCache**: time-windowed gate in front of the package index refresh
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{apply_in_order, ApplyContext, BoxedResource, NoProgress};
//!
//! let resources: Vec<BoxedResource> = build_resources();
//! let mut ctx = ApplyContext::new(&runner);
//! let changed = apply_in_order(&resources, &mut ctx, &mut NoProgress)?;
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`CommandRunner`]: runs external commands
//! - [`ProgressCallback`]: receives progress updates
//! - [`FreshnessStore`] and [`Clock`]: persisted refresh time and "now"
//! - [`IndexRefresher`]: performs the actual index refresh
//!
//! This keeps the crate free of any particular process runner, UI or
//! package manager.

pub mod context;
pub mod freshness;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, CommandRunner, NoProgress, ProgressCallback};
pub use freshness::{
    Clock, FRESHNESS_WINDOW_DAYS, Freshness, FreshnessStore, IndexCache, IndexRefresher,
    MarkerFileStore, MarkerPolicy, MemoryStore, SystemClock,
};
pub use resource::{BoxedResource, Resource, apply_in_order};
pub use types::{ApplyResult, CommandError, CommandOutput, ConvergeSummary};
