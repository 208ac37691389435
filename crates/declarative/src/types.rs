//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Output;
use thiserror::Error;

/// Result of applying a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// The system did not satisfy the desired state and was modified
    Changed,
    /// The desired state already held; nothing was done
    NoChange,
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed)
    }

    /// Build a result from a "did anything change" flag
    pub fn from_changed(changed: bool) -> Self {
        if changed { Self::Changed } else { Self::NoChange }
    }
}

impl fmt::Display for ApplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Changed => write!(f, "changed"),
            Self::NoChange => write!(f, "unchanged"),
        }
    }
}

/// Summary of a convergence run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergeSummary {
    pub changed: usize,
    pub no_change: usize,
    /// Number of package index refreshes performed during the run
    pub index_refreshes: usize,
}

impl ConvergeSummary {
    /// Total number of resources applied
    pub fn total(&self) -> usize {
        self.changed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: ApplyResult) {
        match result {
            ApplyResult::Changed => self.changed += 1,
            ApplyResult::NoChange => self.no_change += 1,
        }
    }
}

/// Output from an external command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            code: output.status.code(),
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into().into_bytes(),
            stderr: Vec::new(),
            code: Some(0),
            success: true,
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into().into_bytes(),
            code: Some(code),
            success: false,
        }
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Stdout followed by stderr, the way a terminal would have shown them
    pub fn combined(&self) -> String {
        let mut out = self.stdout_str();
        let err = self.stderr_str();
        if !out.is_empty() && !err.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&err);
        out
    }

    /// Turn a failed output into a [`CommandError`]
    pub fn into_result(self, program: &str, args: &[&str]) -> Result<Self, CommandError> {
        if self.success {
            Ok(self)
        } else {
            Err(CommandError::new(program, args, &self))
        }
    }
}

/// An external command exited unsuccessfully
#[derive(Debug, Error)]
#[error("`{command}` failed ({status}):\n{output}")]
pub struct CommandError {
    /// The command line that was run
    pub command: String,
    /// Human readable exit status
    pub status: String,
    /// Combined stdout and stderr, trimmed
    pub output: String,
}

impl CommandError {
    pub fn new(program: &str, args: &[&str], output: &CommandOutput) -> Self {
        let mut command = program.to_string();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        let status = match output.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        Self {
            command,
            status,
            output: output.combined().trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = ConvergeSummary::default();
        summary.add_result(ApplyResult::Changed);
        summary.add_result(ApplyResult::NoChange);
        summary.add_result(ApplyResult::NoChange);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.no_change, 2);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_combined_output_joins_streams() {
        let output = CommandOutput {
            stdout: b"Reading package lists...".to_vec(),
            stderr: b"E: Unable to locate package nope\n".to_vec(),
            code: Some(100),
            success: false,
        };
        assert_eq!(
            output.combined(),
            "Reading package lists...\nE: Unable to locate package nope\n"
        );
    }

    #[test]
    fn test_into_result_keeps_diagnostics() {
        let err = CommandOutput::failed(100, "E: Unable to locate package nope\n")
            .into_result("apt-get", &["install", "-y", "nope"])
            .unwrap_err();
        assert_eq!(err.command, "apt-get install -y nope");
        assert_eq!(err.status, "exit code 100");
        assert_eq!(err.output, "E: Unable to locate package nope");
        assert!(err.to_string().contains("Unable to locate package"));
    }
}
