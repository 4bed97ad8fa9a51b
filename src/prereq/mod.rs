//! Prerequisites needed before Open Stage Control can be built
//!
//! This module handles:
//! - The static catalog of prerequisites, in install order
//! - Probing the host for each of them ([`probe`])
//! - Installing the ones that are missing ([`install`])

pub mod install;
pub mod probe;

pub use install::{InstallOutcome, install};
pub use probe::{EnvironmentSnapshot, ProbeResult, probe, snapshot};

use crate::runner::CommandSpec;
use crate::version::Version;

const HOMEBREW_INSTALL_SCRIPT: &str =
    "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// How a detection command's output is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Exit 0 with a non-empty stdout (e.g. `xcode-select -p` printing a path)
    NonEmptyOutput,
    /// Exit 0; the version is read from stdout
    VersionBanner,
}

/// A prerequisite and how to detect and install it. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerequisiteSpec {
    pub name: String,
    pub detect: CommandSpec,
    pub detection: Detection,
    pub minimum_version: Option<Version>,
    pub install: CommandSpec,
    /// Installation hands off to a GUI and cannot be awaited
    pub interactive: bool,
    /// Shell change the operator may need before a fresh install is visible
    pub shell_hint: Option<String>,
}

impl PrerequisiteSpec {
    /// Action the operator has to finish before re-running
    pub fn manual_action(&self) -> String {
        if self.interactive {
            format!(
                "Finish the {} installer that was opened on your screen",
                self.name
            )
        } else if let Some(hint) = &self.shell_hint {
            format!("Update your shell so {} is on PATH: {}", self.name, hint)
        } else {
            format!("Make sure {} is installed and on PATH", self.name)
        }
    }
}

/// Xcode Command Line Tools. `xcode-select --install` opens a GUI dialog and
/// returns before the human finishes it.
pub fn xcode_command_line_tools() -> PrerequisiteSpec {
    PrerequisiteSpec {
        name: "xcode-clt".to_string(),
        detect: CommandSpec::new("xcode-select", ["-p"]),
        detection: Detection::NonEmptyOutput,
        minimum_version: None,
        install: CommandSpec::new("xcode-select", ["--install"]),
        interactive: true,
        shell_hint: None,
    }
}

pub fn homebrew() -> PrerequisiteSpec {
    PrerequisiteSpec {
        name: "brew".to_string(),
        detect: CommandSpec::new("brew", ["--version"]),
        detection: Detection::VersionBanner,
        minimum_version: None,
        install: CommandSpec::new(
            "/bin/bash",
            [
                "-c".to_string(),
                format!("/bin/bash -c \"$(curl -fsSL {})\"", HOMEBREW_INSTALL_SCRIPT),
            ],
        )
        .env("NONINTERACTIVE", "1")
        .inherit_output(),
        interactive: false,
        shell_hint: Some("eval \"$(/opt/homebrew/bin/brew shellenv)\"".to_string()),
    }
}

pub fn node(minimum: Version) -> PrerequisiteSpec {
    PrerequisiteSpec {
        name: "node".to_string(),
        detect: CommandSpec::new("node", ["--version"]),
        detection: Detection::VersionBanner,
        minimum_version: Some(minimum),
        install: CommandSpec::new("brew", ["install", "node"]).inherit_output(),
        interactive: false,
        shell_hint: None,
    }
}

/// All prerequisites in declared order: each may depend on the ones before it
pub fn catalog(node_minimum: Version) -> Vec<PrerequisiteSpec> {
    vec![xcode_command_line_tools(), homebrew(), node(node_minimum)]
}
