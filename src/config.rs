//! Installer configuration
//!
//! Every setting has a compiled-in default. An optional YAML file can override
//! them; it is read from `$OSC_INSTALLER_CONFIG` when set, otherwise from
//! `<config_dir>/osc-installer/config.yaml` when that file exists.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InstallerError, Result};
use crate::version::Version;

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "OSC_INSTALLER_CONFIG";

/// First Open Stage Control release that runs on Apple Silicon
pub const MINIMUM_APP_VERSION: Version = Version::new(1, 29, 6);

const DEFAULT_APP_VERSION: &str = "1.29.7";
const DEFAULT_REPOSITORY_URL: &str = "https://github.com/jean-emmanuel/open-stage-control.git";
const DEFAULT_INSTALL_ROOT: &str = "/Applications/Open Stage Control";
const DEFAULT_NODE_MINIMUM: &str = "20.0.0";

/// Name of the bundle the packaging step produces
pub const PACKAGED_APP_NAME: &str = "open-stage-control.app";
/// Directory (under `dist/`) the packaging step writes for darwin/arm64
pub const PACKAGE_DIR_NAME: &str = "open-stage-control-darwin-arm64";
/// Name of the bundle inside the install directory
pub const INSTALLED_APP_NAME: &str = "Open Stage Control.app";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Open Stage Control release to build
    pub app_version: String,

    /// Git URL of the Open Stage Control repository
    pub repository_url: String,

    /// Branch or tag to check out; defaults to `v<app_version>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    /// Where the source tree is kept between runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,

    /// Parent of the versioned install directory
    pub install_root: PathBuf,

    /// Oldest Node.js accepted as already installed
    pub node_minimum_version: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            app_version: DEFAULT_APP_VERSION.to_string(),
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            git_ref: None,
            source_dir: None,
            install_root: PathBuf::from(DEFAULT_INSTALL_ROOT),
            node_minimum_version: DEFAULT_NODE_MINIMUM.to_string(),
        }
    }
}

impl InstallerConfig {
    /// Load configuration from the environment-selected file, the default
    /// location, or built-in defaults, in that order.
    pub fn load() -> Result<Self> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        if let Some(path) = default_config_path() {
            if path.is_file() {
                return Self::from_file(&path);
            }
        }

        debug!("no configuration file found, using defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading configuration");
        let content = fs::read_to_string(path).map_err(|e| InstallerError::ConfigReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            InstallerError::ConfigParseFailed { reason, .. } => InstallerError::ConfigParseFailed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that versions parse and the release supports Apple Silicon
    pub fn validate(&self) -> Result<()> {
        let version = self.version()?;
        if version < MINIMUM_APP_VERSION {
            return Err(InstallerError::ConfigInvalid {
                message: format!(
                    "app_version {} predates Apple Silicon support (first supported: {})",
                    version, MINIMUM_APP_VERSION
                ),
            });
        }
        self.node_minimum()?;
        if self.repository_url.trim().is_empty() {
            return Err(InstallerError::ConfigInvalid {
                message: "repository_url cannot be empty".to_string(),
            });
        }
        if !self.install_root.is_absolute() {
            return Err(InstallerError::ConfigInvalid {
                message: format!(
                    "install_root must be an absolute path: {}",
                    self.install_root.display()
                ),
            });
        }
        Ok(())
    }

    pub fn version(&self) -> Result<Version> {
        self.app_version
            .parse()
            .map_err(|reason| InstallerError::ConfigInvalid {
                message: format!("app_version: {}", reason),
            })
    }

    pub fn node_minimum(&self) -> Result<Version> {
        self.node_minimum_version
            .parse()
            .map_err(|reason| InstallerError::ConfigInvalid {
                message: format!("node_minimum_version: {}", reason),
            })
    }

    /// Branch or tag to build; the release tag `v<major.minor.patch>` by default
    pub fn git_ref(&self) -> Result<String> {
        match &self.git_ref {
            Some(r) => Ok(r.clone()),
            None => Ok(format!("v{}", self.version()?)),
        }
    }

    pub fn source_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.source_dir {
            return Ok(dir.clone());
        }
        dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .map(|downloads| downloads.join("open-stage-control"))
            .ok_or_else(|| InstallerError::ConfigInvalid {
                message: "could not determine a source directory; set source_dir".to_string(),
            })
    }

    /// Versioned directory the application is installed into
    pub fn install_dir(&self) -> Result<PathBuf> {
        Ok(self.install_root.join(format!("v{}", self.version()?)))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("osc-installer").join("config.yaml"))
}
