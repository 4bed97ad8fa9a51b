//! Building Open Stage Control with its own npm scripts

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{PACKAGE_DIR_NAME, PACKAGED_APP_NAME};
use crate::error::{InstallerError, Result};
use crate::progress::StepSpinner;
use crate::runner::{CommandRunner, CommandSpec};

/// The packaged application produced by a successful build.
///
/// Handing it to the deployer moves it out of the source tree.
#[derive(Debug, PartialEq, Eq)]
pub struct BuildArtifact {
    path: PathBuf,
}

impl BuildArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Where the packaging step leaves the darwin/arm64 bundle
pub fn artifact_path(source_dir: &Path) -> PathBuf {
    source_dir
        .join("dist")
        .join(PACKAGE_DIR_NAME)
        .join(PACKAGED_APP_NAME)
}

/// The npm invocations, in order: dependencies, build, package
pub fn build_steps(source_dir: &Path) -> Vec<(&'static str, CommandSpec)> {
    vec![
        (
            "install dependencies",
            CommandSpec::new("npm", ["install"]).in_dir(source_dir),
        ),
        (
            "build",
            CommandSpec::new("npm", ["run", "build"]).in_dir(source_dir),
        ),
        (
            "package",
            CommandSpec::new("npm", ["run", "package"])
                .in_dir(source_dir)
                .env("PLATFORM", "darwin")
                .env("ARCH", "arm64"),
        ),
    ]
}

/// Run every build step; the first non-zero exit aborts the build
pub fn build(runner: &dyn CommandRunner, source_dir: &Path) -> Result<BuildArtifact> {
    for (step, command) in build_steps(source_dir) {
        info!(step, command = %command, "build step");
        let spinner = StepSpinner::start(&format!("npm: {}", step));

        let output = match runner.run(&command) {
            Ok(output) => output,
            Err(e) => {
                spinner.fail();
                return Err(InstallerError::BuildFailed {
                    step: step.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if !output.success() {
            spinner.fail();
            return Err(InstallerError::BuildFailed {
                step: step.to_string(),
                reason: output.failure_reason(),
            });
        }
        spinner.finish();
    }

    Ok(BuildArtifact::new(artifact_path(source_dir)))
}
