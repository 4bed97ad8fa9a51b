//! osc-installer - Open Stage Control builder for Apple Silicon
//!
//! Detects and installs the toolchain Open Stage Control needs, fetches its
//! source, builds it with npm and installs the packaged app. Safe to re-run:
//! every invocation re-reads the state of the host instead of a checkpoint.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod build;
mod cli;
mod common;
mod config;
mod deploy;
mod error;
mod git;
mod host;
mod orchestrator;
mod prereq;
mod progress;
mod runner;
mod source;
#[cfg(test)]
mod test_fixtures;
mod ui;
mod version;

use cli::Cli;
use config::InstallerConfig;
use deploy::FsDeployer;
use error::Result;
use orchestrator::{Orchestrator, Target};
use runner::SystemRunner;
use source::GitRepository;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Everything that must hold before the state machine starts
fn prepare() -> Result<(InstallerConfig, Target)> {
    host::ensure_current_supported()?;
    let config = InstallerConfig::load()?;
    let target = Target::from_config(&config)?;
    Ok((config, target))
}

fn main() {
    let _cli = Cli::parse();
    init_logging();

    let (config, target) = match prepare() {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let prerequisites = match config.node_minimum() {
        Ok(minimum) => prereq::catalog(minimum),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let runner = SystemRunner;
    let repository = GitRepository;
    let deployer = FsDeployer;
    let orchestrator = Orchestrator::new(&runner, &repository, &deployer, prerequisites, target);

    let report = orchestrator.run();
    tracing::debug!(
        history = ?report.history,
        restart_install_occurred = report.restart_install_occurred,
        "run finished"
    );
    ui::report(&report, orchestrator.target());
    std::process::exit(report.exit_code());
}
