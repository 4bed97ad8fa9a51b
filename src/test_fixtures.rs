//! Test fixtures: a scripted host, fake collaborators, and filesystem helpers.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::FakeHost;
//!
//! let host = FakeHost::new();
//! host.set_output("node --version", "v20.11.1");
//! host.on_run("brew install node", "node --version", "v22.0.0");
//! ```
//!
//! Commands are keyed by their display form (`program arg arg`). A command
//! with no scripted response behaves like a missing executable.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

use crate::build::BuildArtifact;
use crate::deploy::{ArtifactDeployer, DeployOutcome};
use crate::error::{InstallerError, Result};
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};
use crate::source::{LocalTree, SourceRepository};

#[derive(Debug, Clone)]
enum Scripted {
    Output(CommandOutput),
    SpawnFailure,
}

/// Scripted [`CommandRunner`] standing in for the host machine
#[derive(Default)]
pub struct FakeHost {
    responses: RefCell<HashMap<String, Scripted>>,
    effects: RefCell<HashMap<String, Vec<(String, String)>>>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// `command` exits 0 printing `stdout`
    pub fn set_output(&self, command: &str, stdout: &str) {
        self.responses.borrow_mut().insert(
            command.to_string(),
            Scripted::Output(CommandOutput {
                exit_code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        );
    }

    pub fn set_failure(&self, command: &str, exit_code: i32, stderr: &str) {
        self.responses.borrow_mut().insert(
            command.to_string(),
            Scripted::Output(CommandOutput {
                exit_code: Some(exit_code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
        );
    }

    pub fn set_spawn_failure(&self, command: &str) {
        self.responses
            .borrow_mut()
            .insert(command.to_string(), Scripted::SpawnFailure);
    }

    /// After `trigger` runs successfully, `command` starts printing `stdout`
    pub fn on_run(&self, trigger: &str, command: &str, stdout: &str) {
        self.effects
            .borrow_mut()
            .entry(trigger.to_string())
            .or_default()
            .push((command.to_string(), stdout.to_string()));
    }

    /// Every command run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == command).count()
    }

    /// Most recent invocation of `command`
    pub fn spec_for(&self, command: &str) -> Option<CommandSpec> {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find(|spec| spec.to_string() == command)
            .cloned()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(command.clone());
        let key = command.to_string();

        let scripted = self.responses.borrow().get(&key).cloned();
        match scripted {
            None => Err(InstallerError::CommandNotFound {
                program: command.program.clone(),
            }),
            Some(Scripted::SpawnFailure) => Err(InstallerError::CommandSpawnFailed {
                program: command.program.clone(),
                reason: "Resource temporarily unavailable".to_string(),
            }),
            Some(Scripted::Output(output)) => {
                if output.success() {
                    let effects = self.effects.borrow().get(&key).cloned().unwrap_or_default();
                    for (target, stdout) in effects {
                        self.set_output(&target, &stdout);
                    }
                }
                Ok(output)
            }
        }
    }
}

/// [`SourceRepository`] that remembers which destinations were cloned
#[derive(Default)]
pub struct FakeRepository {
    checkouts: RefCell<HashSet<PathBuf>>,
    failure: RefCell<Option<String>>,
    calls: RefCell<Vec<String>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, reason: &str) {
        *self.failure.borrow_mut() = Some(reason.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clone_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with("clone "))
            .count()
    }

    fn check_failure(&self, url: &str) -> Result<()> {
        match self.failure.borrow().as_ref() {
            Some(reason) => Err(InstallerError::FetchFailed {
                url: url.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl SourceRepository for FakeRepository {
    fn inspect(&self, path: &Path) -> LocalTree {
        if self.checkouts.borrow().contains(path) {
            LocalTree::Checkout
        } else {
            LocalTree::Missing
        }
    }

    fn clone_into(&self, url: &str, _git_ref: &str, path: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("clone {}", path.display()));
        self.check_failure(url)?;
        self.checkouts.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }

    fn update(&self, path: &Path, _git_ref: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("update {}", path.display()));
        self.check_failure(&path.display().to_string())
    }
}

/// [`ArtifactDeployer`] that records what it was handed
#[derive(Default)]
pub struct RecordingDeployer {
    deployed: RefCell<Vec<(PathBuf, PathBuf)>>,
}

impl RecordingDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(artifact, install_dir)` pairs, in call order
    pub fn deployed(&self) -> Vec<(PathBuf, PathBuf)> {
        self.deployed.borrow().clone()
    }
}

impl ArtifactDeployer for RecordingDeployer {
    fn deploy(&self, artifact: BuildArtifact, install_dir: &Path) -> Result<DeployOutcome> {
        self.deployed
            .borrow_mut()
            .push((artifact.path().to_path_buf(), install_dir.to_path_buf()));
        Ok(DeployOutcome::Installed(install_dir.join("Open Stage Control.app")))
    }
}

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Create a temp directory with a git repository initialized.
///
/// # Panics
///
/// Panics if the temp directory or git repository cannot be created.
#[must_use]
pub fn create_git_repo() -> (TempDir, PathBuf) {
    let temp = create_temp_dir();
    let path = temp.path().to_path_buf();
    Repository::init(&path).expect("Failed to init git repository");
    (temp, path)
}

/// Write `name` in the repository's working tree and commit it on HEAD
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
    let workdir = repo.workdir().expect("Repository has no working directory");
    std::fs::write(workdir.join(name), content).expect("Failed to write file");

    let mut index = repo.index().expect("Failed to open index");
    index
        .add_path(Path::new(name))
        .expect("Failed to stage file");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");

    let sig = Signature::now("Test", "test@test.com").expect("Failed to create signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to commit")
}

/// `file://` URL for a local repository
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Minimal `.app` bundle whose executable contains `marker`
pub fn create_fake_app(path: &Path, marker: &str) -> PathBuf {
    let macos = path.join("Contents").join("MacOS");
    std::fs::create_dir_all(&macos).expect("Failed to create bundle directories");
    std::fs::write(path.join("Contents").join("Info.plist"), "<plist/>")
        .expect("Failed to write Info.plist");
    std::fs::write(macos.join("open-stage-control"), marker).expect("Failed to write executable");
    path.to_path_buf()
}
