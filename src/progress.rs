//! Terminal progress for convergence runs

use colored::Colorize;
use declarative::{ApplyResult, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui;

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Prints one line per resource, with a spinner while it is applied
pub struct ConsoleProgress {
    quiet: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: None,
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_phase_start(&mut self, phase: &str, count: usize) {
        self.clear_spinner();
        if self.quiet || count == 0 {
            return;
        }
        ui::section(&phase.replace('_', " "));
    }

    fn on_resource_start(&mut self, _id: &str, description: &str) {
        self.clear_spinner();
        if !self.quiet {
            self.spinner = Some(spinner(description));
        }
    }

    fn on_resource_complete(&mut self, id: &str, result: ApplyResult) {
        self.clear_spinner();
        if self.quiet {
            return;
        }
        match result {
            ApplyResult::Changed => println!("  {} {} {}", "✓".green(), id, "changed".green()),
            ApplyResult::NoChange => println!("  {} {}", "·".dimmed(), id.dimmed()),
        }
    }

    fn on_index_refresh(&mut self, reason: &str) {
        self.clear_spinner();
        if !self.quiet {
            self.spinner = Some(spinner(&format!("Refreshing package index ({reason})")));
        }
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}
