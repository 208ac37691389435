//! # aptkit
//!
//! Thin client for the Debian/Ubuntu package tooling.
//!
//! This crate provides functionality for:
//! - Refreshing the package index (`apt-get update`)
//! - Probing and installing packages (`dpkg-query`, `apt-get install`)
//! - Registering Launchpad PPAs (`add-apt-repository`)
//! - Reading one-line sources files and finding registered PPAs
//!
//! Every command goes through a [`declarative::CommandRunner`], so the
//! client can be driven against a scripted host in tests.
//!
//! ## Example
//!
//! ```ignore
//! use aptkit::{Apt, Ppa};
//!
//! let apt = Apt::new(&runner);
//! apt.update()?;
//! apt.add_ppa(&Ppa::parse("ppa:deadsnakes/ppa")?)?;
//! if !apt.is_installed("python3.12")? {
//!     apt.install("python3.12")?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod sources;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use sources::{SourceFile, find_ppa, list_dir};
pub use types::{EntryKind, InstallOutcome, PPA_HOSTS, Ppa, SourceEntry};

use declarative::{CommandOutput, CommandRunner, IndexRefresher};

const APT_GET: &str = "apt-get";

/// Client for apt operations.
pub struct Apt<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Apt<'a> {
    /// Create a client running commands through `runner`.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        log::debug!("run: {} {}", cmd, args.join(" "));
        Ok(self.runner.run(cmd, args)?)
    }

    /// Run a command and classify a non-zero exit from its output.
    fn run_checked(
        &self,
        cmd: &str,
        args: &[&str],
        package_name: Option<&str>,
    ) -> Result<CommandOutput> {
        let output = self.run(cmd, args)?;
        if output.success {
            return Ok(output);
        }
        let command = std::iter::once(cmd)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        Err(Error::from_apt_output(
            &command,
            &output.combined(),
            package_name,
        ))
    }

    /// Refresh the package index.
    pub fn update(&self) -> Result<()> {
        self.run_checked(APT_GET, &["update", "-q"], None)?;
        Ok(())
    }

    /// Check if a package is installed.
    pub fn is_installed(&self, name: &str) -> Result<bool> {
        let output = self.run("dpkg-query", &["-W", "-f=${Status}", name])?;
        Ok(output.success && output.stdout_str().contains("install ok installed"))
    }

    /// Install a package non-interactively.
    ///
    /// apt's own "already the newest version" report is an
    /// [`InstallOutcome::AlreadyInstalled`], not an error.
    pub fn install(&self, name: &str) -> Result<InstallOutcome> {
        match self.run_checked(APT_GET, &["install", "-y", "-q", name], Some(name)) {
            Ok(output) if output.stdout_str().contains("is already the newest version") => {
                Ok(InstallOutcome::AlreadyInstalled)
            }
            Ok(_) => Ok(InstallOutcome::Installed),
            Err(e) if e.is_ignorable() => Ok(InstallOutcome::AlreadyInstalled),
            Err(e) => Err(e),
        }
    }

    /// Register a PPA, importing its signing key.
    pub fn add_ppa(&self, ppa: &Ppa) -> Result<()> {
        let name = ppa.to_string();
        self.run_checked("add-apt-repository", &["-y", &name], Some(&name))?;
        Ok(())
    }
}

impl IndexRefresher for Apt<'_> {
    fn refresh(&self) -> anyhow::Result<()> {
        Ok(self.update()?)
    }
}
