//! Apply context and provider traits
//!
//! These traits allow the declarative crate to be used without
//! depending on a specific process runner or terminal UI.

use crate::types::{ApplyResult, CommandOutput};
use anyhow::Result;

/// Provider for external command execution
///
/// Every interaction a resource has with OS tooling goes through this
/// trait, so a whole convergence run can be replayed against a scripted
/// host in tests.
pub trait CommandRunner {
    /// Run a command to completion and capture its output
    ///
    /// A non-zero exit is not an error at this level; callers decide
    /// what the output means.
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run a command and return just success/failure
    fn run_status(&self, cmd: &str, args: &[&str]) -> Result<bool> {
        Ok(self.run(cmd, args)?.success)
    }

    /// Run a command, failing with its combined output if it exits non-zero
    fn run_checked(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        Ok(self.run(cmd, args)?.into_result(cmd, args)?)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        (**self).run(cmd, args)
    }
}

/// Progress callback for convergence
///
/// Implement this trait to receive progress updates during a run.
pub trait ProgressCallback {
    /// Called when a phase (one resource kind) starts
    fn on_phase_start(&mut self, phase: &str, count: usize);

    /// Called when starting to apply a single resource
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource application completes successfully
    fn on_resource_complete(&mut self, id: &str, result: ApplyResult);

    /// Called when the package index is about to be refreshed
    fn on_index_refresh(&mut self, reason: &str);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&mut self, _phase: &str, _count: usize) {}
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _result: ApplyResult) {}
    fn on_index_refresh(&mut self, _reason: &str) {}
}

/// Context passed to resource apply operations
pub struct ApplyContext<'a> {
    /// Runner for every external command the resource needs
    pub runner: &'a dyn CommandRunner,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Run a command and capture its output
    pub fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        log::debug!("run: {} {}", cmd, args.join(" "));
        self.runner.run(cmd, args)
    }

    /// Run a command, failing with its combined output on non-zero exit
    pub fn run_checked(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        log::debug!("run: {} {}", cmd, args.join(" "));
        self.runner.run_checked(cmd, args)
    }
}
