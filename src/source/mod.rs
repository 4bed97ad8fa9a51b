//! Source acquisition
//!
//! [`fetch`] clones the repository when no source tree exists at the
//! destination and updates it in place otherwise. Version control itself sits
//! behind [`SourceRepository`]; [`GitRepository`] is the real implementation.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{InstallerError, Result};
use crate::git;

/// What currently occupies a source destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTree {
    /// Nothing there, or an empty directory
    Missing,
    /// A checkout that can be updated
    Checkout,
    /// Something else; never overwritten
    Foreign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Cloned,
    Updated,
}

/// Version-control collaborator
pub trait SourceRepository {
    fn inspect(&self, path: &Path) -> LocalTree;
    fn clone_into(&self, url: &str, git_ref: &str, path: &Path) -> Result<()>;
    fn update(&self, path: &Path, git_ref: &str) -> Result<()>;
}

/// Bring `destination` to `git_ref` of `url`, cloning only when needed
pub fn fetch(
    repository: &dyn SourceRepository,
    url: &str,
    git_ref: &str,
    destination: &Path,
) -> Result<FetchOutcome> {
    match repository.inspect(destination) {
        LocalTree::Missing => {
            info!(url, destination = %destination.display(), git_ref, "cloning source");
            repository.clone_into(url, git_ref, destination)?;
            Ok(FetchOutcome::Cloned)
        }
        LocalTree::Checkout => {
            info!(destination = %destination.display(), git_ref, "updating source");
            repository.update(destination, git_ref)?;
            Ok(FetchOutcome::Updated)
        }
        LocalTree::Foreign => Err(InstallerError::SourceTreeCorrupted {
            path: destination.display().to_string(),
            reason: "directory exists but is not a git checkout".to_string(),
        }),
    }
}

/// git2-backed repository access
#[derive(Debug, Default, Clone, Copy)]
pub struct GitRepository;

impl SourceRepository for GitRepository {
    fn inspect(&self, path: &Path) -> LocalTree {
        if !path.exists() {
            return LocalTree::Missing;
        }
        if path.is_dir()
            && fs::read_dir(path)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false)
        {
            return LocalTree::Missing;
        }
        match git2::Repository::open(path) {
            Ok(repo) if repo.workdir().is_some() => LocalTree::Checkout,
            _ => LocalTree::Foreign,
        }
    }

    fn clone_into(&self, url: &str, git_ref: &str, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| InstallerError::FetchFailed {
                url: url.to_string(),
                reason: format!("Failed to create {}: {}", parent.display(), e),
            })?;
        }
        let repo = git::clone(url, path)?;
        let sha = git::resolve_ref(&repo, git_ref)?;
        git::checkout_commit(&repo, &sha)
    }

    fn update(&self, path: &Path, git_ref: &str) -> Result<()> {
        let repo = git::open(path)?;
        git::fetch_origin(&repo)?;
        let sha = git::resolve_ref(&repo, git_ref)?;
        git::checkout_commit(&repo, &sha)
    }
}
