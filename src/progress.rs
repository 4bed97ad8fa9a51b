//! Spinner display for long-running captured commands

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner shown while a captured command runs
pub struct StepSpinner {
    pb: ProgressBar,
    label: String,
}

impl StepSpinner {
    pub fn start(label: &str) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");

        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style);
        pb.set_message(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            label: label.to_string(),
        }
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
        println!("  {} {}", style("✓").green(), self.label);
    }

    /// Abandon on error
    pub fn fail(self) {
        self.pb.finish_and_clear();
        println!("  {} {}", style("✗").red(), self.label);
    }
}
