//! Error types and handling for osc-installer
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//! Every failure below the orchestrator is returned as one of these values; the
//! orchestrator alone decides whether it ends the run.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for installer operations
#[derive(Error, Diagnostic, Debug)]
pub enum InstallerError {
    // Host errors
    #[error("This installer is not supported on {os}/{arch}")]
    #[diagnostic(
        code(osc_installer::host::unsupported_platform),
        help("Open Stage Control is built here for macOS on Apple Silicon (macos/aarch64) only")
    )]
    UnsupportedPlatform { os: String, arch: String },

    // Command errors
    #[error("Command not found: {program}")]
    #[diagnostic(code(osc_installer::command::not_found))]
    CommandNotFound { program: String },

    #[error("Failed to start '{program}': {reason}")]
    #[diagnostic(code(osc_installer::command::spawn_failed))]
    CommandSpawnFailed { program: String, reason: String },

    // Prerequisite errors
    #[error("Could not determine whether {name} is installed: {reason}")]
    #[diagnostic(code(osc_installer::prereq::detection_failed))]
    DetectionFailed { name: String, reason: String },

    #[error("Failed to install {name}: {reason}")]
    #[diagnostic(
        code(osc_installer::prereq::install_failed),
        help("Install it manually, then run osc-installer again")
    )]
    InstallFailed { name: String, reason: String },

    // Source errors
    #[error("Failed to fetch source from {url}: {reason}")]
    #[diagnostic(
        code(osc_installer::source::fetch_failed),
        help("Check your network connection and that the repository is reachable")
    )]
    FetchFailed { url: String, reason: String },

    #[error("Source tree at '{path}' is unusable: {reason}")]
    #[diagnostic(
        code(osc_installer::source::corrupted),
        help("Remove the directory and run osc-installer again")
    )]
    SourceTreeCorrupted { path: String, reason: String },

    // Build errors
    #[error("Build step '{step}' failed: {reason}")]
    #[diagnostic(code(osc_installer::build::failed))]
    BuildFailed { step: String, reason: String },

    // Deploy errors
    #[error("Build reported success but produced no artifact at '{path}'")]
    #[diagnostic(code(osc_installer::deploy::missing_artifact))]
    MissingArtifact { path: String },

    #[error("Permission denied while installing to '{path}'")]
    #[diagnostic(
        code(osc_installer::deploy::permission_denied),
        help("Make sure your user can write to the install directory")
    )]
    DeployPermissionDenied { path: String },

    #[error("Not enough disk space to install to '{path}'")]
    #[diagnostic(code(osc_installer::deploy::no_space))]
    DeployNoSpace { path: String },

    #[error("Failed to install artifact to '{path}': {reason}")]
    #[diagnostic(code(osc_installer::deploy::failed))]
    DeployFailed { path: String, reason: String },

    // Configuration errors
    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(osc_installer::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(osc_installer::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(osc_installer::config::invalid))]
    ConfigInvalid { message: String },
}

impl From<serde_yaml::Error> for InstallerError {
    fn from(err: serde_yaml::Error) -> Self {
        InstallerError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, InstallerError>;
