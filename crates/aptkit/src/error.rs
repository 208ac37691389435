//! Error types for apt operations.
//!
//! apt reports everything through free-form text, so failures are
//! classified from the tool's output. The category drives what the caller
//! does next: an already-installed package is not a failure, everything
//! else aborts with the captured output.

use thiserror::Error;

/// Categories of apt errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Mirror or network unreachable
    Network,
    /// Package or archive not found
    NotFound,
    /// dpkg/apt lock held by another process
    Locked,
    /// Not running as root
    Permission,
    /// Package is already installed at the newest version
    AlreadyInstalled,
    /// Malformed input (PPA name, sources line)
    Invalid,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error can be safely ignored (operation already done).
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::AlreadyInstalled)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Package not found",
            Self::Locked => "Package database locked",
            Self::Permission => "Permission denied",
            Self::AlreadyInstalled => "Already installed",
            Self::Invalid => "Invalid input",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check network access to the configured mirrors and try again",
            Self::NotFound => {
                "Verify the package name, or add the repository or PPA that provides it"
            }
            Self::Locked => "Wait for the other apt/dpkg process (e.g. unattended-upgrades) to finish",
            Self::Permission => "Run as root",
            Self::AlreadyInstalled => "No action needed - package is already installed",
            Self::Invalid => "Fix the manifest entry",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during apt operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error (DNS, unreachable mirror, timeout)
    #[error("network error: {message}")]
    Network {
        /// Output of the failed command
        message: String,
    },

    /// Package not found in any configured source
    #[error("package not found: {name}\n{message}")]
    NotFound {
        /// Name of the package that could not be found
        name: String,
        /// Output of the failed command
        message: String,
    },

    /// apt or dpkg lock held by another process
    #[error("package database locked: {message}")]
    Locked {
        /// Output of the failed command
        message: String,
    },

    /// Insufficient privileges
    #[error("permission denied: {message}")]
    Permission {
        /// Output of the failed command
        message: String,
    },

    /// Package is already installed
    #[error("already installed: {name}")]
    AlreadyInstalled {
        /// Name of the already-installed package
        name: String,
    },

    /// PPA name is not `ppa:owner/archive`
    #[error("invalid PPA '{0}' (expected ppa:owner/archive)")]
    InvalidPpa(String),

    /// Invalid one-line sources syntax
    #[error("invalid sources entry at line {line}: {message}")]
    SourceParse {
        /// Line number where the parse error occurred (1-indexed)
        line: usize,
        /// Description of the syntax error
        message: String,
    },

    /// Command exited non-zero for an unrecognized reason
    #[error("`{command}` failed:\n{output}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Combined output of the command
        output: String,
    },

    /// The command could not be run at all
    #[error(transparent)]
    Runner(#[from] anyhow::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Locked { .. } => ErrorCategory::Locked,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::AlreadyInstalled { .. } => ErrorCategory::AlreadyInstalled,
            Error::InvalidPpa(_) | Error::SourceParse { .. } => ErrorCategory::Invalid,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error can be safely ignored.
    pub fn is_ignorable(&self) -> bool {
        self.category().is_ignorable()
    }

    /// Create an error from apt command output.
    ///
    /// Analyzes the combined output to categorize the error appropriately.
    pub fn from_apt_output(command: &str, output: &str, package_name: Option<&str>) -> Self {
        let lower = output.to_lowercase();
        let message = output.trim().to_string();

        // apt phrases a missing root as a lock failure, so check privileges first
        if lower.contains("are you root")
            || lower.contains("permission denied")
            || lower.contains("must be run as root")
        {
            return Error::Permission { message };
        }

        if lower.contains("could not get lock")
            || lower.contains("unable to lock")
            || lower.contains("is another process using it")
        {
            return Error::Locked { message };
        }

        if lower.contains("unable to locate package")
            || lower.contains("has no installation candidate")
            || lower.contains("no packages found matching")
            || lower.contains("cannot add ppa")
            || lower.contains("ppa not found")
        {
            return Error::NotFound {
                name: package_name.unwrap_or("unknown").to_string(),
                message,
            };
        }

        if lower.contains("is already the newest version") {
            return Error::AlreadyInstalled {
                name: package_name.unwrap_or("unknown").to_string(),
            };
        }

        if lower.contains("temporary failure resolving")
            || lower.contains("could not resolve")
            || lower.contains("failed to fetch")
            || lower.contains("connection timed out")
            || lower.contains("connection refused")
            || lower.contains("network is unreachable")
        {
            return Error::Network { message };
        }

        Error::CommandFailed {
            command: command.to_string(),
            output: message,
        }
    }
}

/// Result type for apt operations.
pub type Result<T> = std::result::Result<T, Error>;
