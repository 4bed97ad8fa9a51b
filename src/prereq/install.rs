//! Prerequisite installation
//!
//! The installer does not check whether a prerequisite is already present;
//! the orchestrator only calls it for prerequisites the last probe reported
//! as unmet.

use tracing::{info, warn};

use super::PrerequisiteSpec;
use crate::error::{InstallerError, Result};
use crate::runner::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The install command ran to completion
    Completed,
    /// A GUI installer was launched; the run must stop and be re-invoked
    /// after the operator finishes it
    RequiresManualStepThenRestart,
}

/// Run the install command for `spec`. `Err` is an install failure.
pub fn install(runner: &dyn CommandRunner, spec: &PrerequisiteSpec) -> Result<InstallOutcome> {
    info!(prerequisite = %spec.name, command = %spec.install, "installing");

    let output = runner
        .run(&spec.install)
        .map_err(|e| InstallerError::InstallFailed {
            name: spec.name.clone(),
            reason: e.to_string(),
        })?;

    if spec.interactive {
        // The exit status of a GUI handoff does not say whether it is done
        if !output.success() {
            warn!(
                prerequisite = %spec.name,
                reason = %output.failure_reason(),
                "interactive installer reported an error"
            );
        }
        return Ok(InstallOutcome::RequiresManualStepThenRestart);
    }

    if !output.success() {
        return Err(InstallerError::InstallFailed {
            name: spec.name.clone(),
            reason: output.failure_reason(),
        });
    }

    Ok(InstallOutcome::Completed)
}
