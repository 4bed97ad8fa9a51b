//! Host platform guard
//!
//! Open Stage Control is packaged here for darwin/arm64 only; any other host is
//! rejected before a single command runs.

use crate::error::{InstallerError, Result};

pub const SUPPORTED_OS: &str = "macos";
pub const SUPPORTED_ARCH: &str = "aarch64";

/// Fail unless `os`/`arch` is macOS on Apple Silicon
pub fn ensure_supported(os: &str, arch: &str) -> Result<()> {
    if os == SUPPORTED_OS && arch == SUPPORTED_ARCH {
        Ok(())
    } else {
        Err(InstallerError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
    }
}

/// Check the platform this binary was compiled for
pub fn ensure_current_supported() -> Result<()> {
    ensure_supported(std::env::consts::OS, std::env::consts::ARCH)
}
