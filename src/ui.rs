//! Operator-facing status output

use std::path::Path;

use console::Style;

use crate::orchestrator::{RunReport, State, Step, Target};
use crate::prereq::EnvironmentSnapshot;
use crate::source::FetchOutcome;

pub fn step_header(step: Step) {
    let label = match step {
        Step::ProbingPrereqs => "Checking prerequisites",
        Step::InstallingPrereqs => "Installing prerequisites",
        Step::Fetching => "Fetching Open Stage Control source",
        Step::Building => "Building Open Stage Control",
        Step::Deploying => "Installing Open Stage Control",
    };
    println!(
        "{} {}",
        Style::new().bold().cyan().apply_to("==>"),
        Style::new().bold().apply_to(label)
    );
}

pub fn snapshot(snapshot: &EnvironmentSnapshot) {
    for result in &snapshot.results {
        let version = result
            .version
            .map(|v| format!(" {}", v))
            .unwrap_or_default();
        if result.is_satisfied() {
            println!(
                "  {} {}{}",
                Style::new().green().apply_to("✓"),
                result.name,
                version
            );
        } else {
            let why = if result.present {
                "too old"
            } else {
                "missing"
            };
            println!(
                "  {} {}{} {}",
                Style::new().red().apply_to("✗"),
                result.name,
                version,
                Style::new().dim().apply_to(format!("({})", why))
            );
        }
    }
}

pub fn installed(name: &str) {
    println!("  {} installed {}", Style::new().green().apply_to("✓"), name);
}

pub fn fetched(outcome: FetchOutcome, path: &Path) {
    let verb = match outcome {
        FetchOutcome::Cloned => "cloned into",
        FetchOutcome::Updated => "updated",
    };
    println!(
        "  {} source {} {}",
        Style::new().green().apply_to("✓"),
        verb,
        path.display()
    );
}

/// Final message for the run. Failures go to stderr.
pub fn report(report: &RunReport, target: &Target) {
    match &report.final_state {
        State::Done => {
            let location = report
                .installed
                .as_deref()
                .unwrap_or(target.install_dir.as_path());
            println!(
                "{} Installed Open Stage Control v{} to {}",
                Style::new().bold().green().apply_to("Done:"),
                target.version,
                location.display()
            );
        }
        State::Terminated(restart) => {
            println!(
                "{} {} needs a manual step.",
                Style::new().bold().yellow().apply_to("Action required:"),
                restart.prerequisite
            );
            println!("  {}", restart.action);
            println!("  Then re-run osc-installer once it has finished.");
        }
        State::Failed { step, reason } => {
            eprintln!(
                "{} Failed during {}: {}",
                Style::new().bold().red().apply_to("Error:"),
                step,
                reason
            );
        }
        other => {
            eprintln!("Run stopped in non-terminal state {:?}", other);
        }
    }
}
