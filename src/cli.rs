use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stackform")]
#[command(author = "stackform contributors")]
#[command(version)]
#[command(about = "Converge a Debian/Ubuntu host to a declarative manifest", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: <config dir>/config.toml)
    #[arg(long, global = true, env = "STACKFORM_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge this host to one or more manifests
    Apply(ApplyArgs),

    /// Show what a run would visit, in order, without changing anything
    Plan(ManifestArgs),

    /// Load, merge and validate manifests
    Validate(ManifestArgs),

    /// Show the last run and package index freshness
    Status,

    /// Refresh the package index now
    Refresh(RefreshArgs),

    /// Describe existing apt sources as a manifest fragment
    Analyze(AnalyzeArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

#[derive(Parser)]
pub struct ManifestArgs {
    /// Manifest files (.json or .toml), merged in order
    #[arg(required = true, value_name = "MANIFEST")]
    pub manifests: Vec<PathBuf>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub manifests: ManifestArgs,

    /// Run even when not root
    #[arg(long)]
    pub skip_root_check: bool,
}

#[derive(Parser)]
pub struct RefreshArgs {
    /// Run even when not root
    #[arg(long)]
    pub skip_root_check: bool,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Directory to read (default: configured sources_dir)
    #[arg(long, value_name = "DIR")]
    pub sources_dir: Option<PathBuf>,
}
