//! Resource trait for declarative state management
//!
//! A Resource is one declared unit of desired state that can be applied
//! to the live system idempotently.

use crate::context::{ApplyContext, ProgressCallback};
use crate::types::ApplyResult;
use anyhow::{Context, Result};
use std::fmt;

/// Core trait for declarative resources
///
/// # Example
///
/// ```ignore
/// use declarative::{ApplyContext, ApplyResult, Resource};
///
/// #[derive(Debug)]
/// struct Directory {
///     path: String,
/// }
///
/// impl Resource for Directory {
///     fn id(&self) -> String {
///         self.path.clone()
///     }
///
///     fn description(&self) -> String {
///         format!("Ensure directory {}", self.path)
///     }
///
///     fn resource_type(&self) -> &'static str {
///         "directory"
///     }
///
///     fn apply(&self, _ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
///         if std::path::Path::new(&self.path).is_dir() {
///             return Ok(ApplyResult::NoChange);
///         }
///         std::fs::create_dir_all(&self.path)?;
///         Ok(ApplyResult::Changed)
///     }
/// }
/// ```
pub trait Resource: fmt::Debug {
    /// Unique identifier for this resource
    ///
    /// Stable within its type. Examples:
    /// - "nginx" for a package
    /// - "ppa:deadsnakes/ppa" for a personal package archive
    /// - "/etc/nginx/sites-enabled/app" for a template
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category, used for grouping and reporting
    fn resource_type(&self) -> &'static str;

    /// Bring the system into the desired state
    ///
    /// This method should:
    /// 1. Detect whether the desired state already holds (return NoChange)
    /// 2. Treat the tool's own "already exists" signal as NoChange
    /// 3. Otherwise make the change and return Changed
    ///
    /// Any other failure is returned as an error and aborts the run.
    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;

/// Apply a sequence of resources in order, stopping at the first error
///
/// Returns whether any of them changed the system. Every resource is
/// applied; a change does not short-circuit the rest. Errors are wrapped
/// with the type and id of the failing resource.
pub fn apply_in_order<'r>(
    resources: impl IntoIterator<Item = &'r BoxedResource>,
    ctx: &mut ApplyContext,
    progress: &mut dyn ProgressCallback,
) -> Result<bool> {
    resources.into_iter().try_fold(false, |changed, resource| {
        let id = resource.id();
        progress.on_resource_start(&id, &resource.description());
        let result = resource
            .apply(ctx)
            .with_context(|| format!("failed to apply {} '{}'", resource.resource_type(), id))?;
        log::info!("{} '{}': {}", resource.resource_type(), id, result);
        progress.on_resource_complete(&id, result);
        Ok::<_, anyhow::Error>(changed | result.is_change())
    })
}
