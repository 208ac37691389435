use anyhow::{Context, Result};
use declarative::{CommandOutput, CommandRunner};
use std::process::{Command, Stdio};

/// Runs commands on the local host
///
/// stdin is closed and apt/dpkg are told not to prompt, so a command that
/// would ask a question fails instead of hanging the run.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        log::debug!("exec: {} {}", cmd, args.join(" "));
        let output = Command::new(cmd)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;
        let output = CommandOutput::from(output);
        log::trace!("exit {:?}: {}", output.code, output.combined().trim());
        Ok(output)
    }
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
