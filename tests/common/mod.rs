//! Common test utilities for osc-installer integration tests

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

// Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
#[allow(deprecated)]
pub fn installer_cmd() -> Command {
    let mut cmd = Command::cargo_bin("osc-installer").unwrap();
    cmd.env_remove("OSC_INSTALLER_CONFIG").env_remove("RUST_LOG");
    cmd
}

/// A scratch directory holding an installer config file
#[allow(dead_code)]
pub struct ConfigDir {
    pub temp: TempDir,
    pub path: PathBuf,
}

#[allow(dead_code)]
impl ConfigDir {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write `config.yaml` and return its path
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.path.join("config.yaml");
        std::fs::write(&path, content).expect("Failed to write config");
        path
    }
}
