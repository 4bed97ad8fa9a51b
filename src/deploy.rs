//! Artifact deployment
//!
//! Deploying replaces the whole install directory: any previous installation
//! is removed before the new bundle is moved in. There is no backup.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::build::BuildArtifact;
use crate::common::fs::{copy_dir_recursive, remove_path};
use crate::config::INSTALLED_APP_NAME;
use crate::error::{InstallerError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Path of the installed application bundle
    Installed(PathBuf),
}

/// Filesystem collaborator that places a built artifact
pub trait ArtifactDeployer {
    fn deploy(&self, artifact: BuildArtifact, install_dir: &Path) -> Result<DeployOutcome>;
}

/// Deploys onto the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDeployer;

impl ArtifactDeployer for FsDeployer {
    fn deploy(&self, artifact: BuildArtifact, install_dir: &Path) -> Result<DeployOutcome> {
        let source = artifact.path();
        // Checked before touching the previous installation
        if !source.exists() {
            return Err(InstallerError::MissingArtifact {
                path: source.display().to_string(),
            });
        }

        if install_dir.exists() {
            info!(path = %install_dir.display(), "removing previous installation");
            remove_path(install_dir).map_err(|e| deploy_error(e, install_dir))?;
        }
        fs::create_dir_all(install_dir).map_err(|e| deploy_error(e, install_dir))?;

        let destination = install_dir.join(INSTALLED_APP_NAME);
        match fs::rename(source, &destination) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                debug!("artifact is on another filesystem, copying");
                copy_into_place(source, &destination)?;
                remove_path(source).map_err(|e| deploy_error(e, source))?;
            }
            Err(e) => return Err(deploy_error(e, &destination)),
        }

        info!(path = %destination.display(), "installed");
        Ok(DeployOutcome::Installed(destination))
    }
}

/// Copy `source` into a staging directory beside `destination`, then rename it
/// into place so a partial copy is never visible at `destination`.
pub fn copy_into_place(source: &Path, destination: &Path) -> Result<()> {
    let parent = destination
        .parent()
        .ok_or_else(|| InstallerError::DeployFailed {
            path: destination.display().to_string(),
            reason: "destination has no parent directory".to_string(),
        })?;

    let staging = tempfile::Builder::new()
        .prefix(".osc-installer-staging-")
        .tempdir_in(parent)
        .map_err(|e| deploy_error(e, parent))?;
    let staged = staging.path().join(
        destination
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new(INSTALLED_APP_NAME)),
    );

    copy_dir_recursive(source, &staged).map_err(|e| deploy_error(e, &staged))?;
    fs::rename(&staged, destination).map_err(|e| deploy_error(e, destination))?;
    Ok(())
}

fn deploy_error(err: io::Error, path: &Path) -> InstallerError {
    let path = path.display().to_string();
    match err.kind() {
        ErrorKind::PermissionDenied => InstallerError::DeployPermissionDenied { path },
        ErrorKind::StorageFull => InstallerError::DeployNoSpace { path },
        _ => InstallerError::DeployFailed {
            path,
            reason: err.to_string(),
        },
    }
}
