//! Shared helpers used across the installer.

pub mod fs;
