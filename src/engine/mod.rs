//! Convergence engine
//!
//! The engine orchestrates:
//! 1. Planning - turn a manifest into validated resources, grouped by step
//! 2. Converging - walk the steps in their fixed order, fail fast
//!
//! There is no dependency graph. The order of [`CONVERGE_STEPS`] is the
//! only ordering guarantee: users exist before anything may run as them,
//! repositories are known before packages are installed from them, and
//! packages are installed before the files, services and databases that
//! need them.

pub mod converge;
pub mod plan;

pub use converge::converge;
pub use plan::Plan;

use std::fmt;

/// One step of a convergence run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Users,
    /// Time-gated package index refresh
    RefreshIndex,
    SourceLists,
    /// Package providing `add-apt-repository`, only when PPAs are declared
    PpaSupport,
    PersonalPackageArchives,
    /// Unconditional refresh, only when a repository changed
    ForceRefresh,
    Packages,
    Templates,
    Services,
    Databases,
}

/// Every step, in execution order
pub const CONVERGE_STEPS: [Step; 10] = [
    Step::Users,
    Step::RefreshIndex,
    Step::SourceLists,
    Step::PpaSupport,
    Step::PersonalPackageArchives,
    Step::ForceRefresh,
    Step::Packages,
    Step::Templates,
    Step::Services,
    Step::Databases,
];

impl Step {
    /// Name reported to progress callbacks
    pub fn name(&self) -> &'static str {
        match self {
            Step::Users => "users",
            Step::RefreshIndex => "package_index",
            Step::SourceLists => "source_lists",
            Step::PpaSupport => "ppa_support",
            Step::PersonalPackageArchives => "personal_package_archives",
            Step::ForceRefresh => "package_index_forced",
            Step::Packages => "packages",
            Step::Templates => "templates",
            Step::Services => "services",
            Step::Databases => "databases",
        }
    }

    /// When a step does not always do its work
    pub fn condition(&self) -> Option<&'static str> {
        match self {
            Step::RefreshIndex => Some("if never refreshed or refreshed 7+ days ago"),
            Step::PpaSupport => Some("if any PPA is declared"),
            Step::ForceRefresh => Some("if a source list or PPA changed"),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
