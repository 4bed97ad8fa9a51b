//! Git operations for the Open Stage Control source tree
//!
//! This module handles:
//! - Cloning the repository
//! - Fetching branches and tags into an existing clone
//! - Resolving refs (branches, tags) to exact SHAs
//! - Forced detached checkouts
//!
//! Authentication is delegated entirely to git's native system
//! (SSH agent, keys under ~/.ssh/, credential helpers).

use std::path::Path;

use git2::{
    Cred, CredentialType, ErrorClass, FetchOptions, RemoteCallbacks, Repository, build::RepoBuilder,
};
use tracing::debug;

use crate::error::{InstallerError, Result};

const FETCH_REFSPECS: [&str; 2] = [
    "+refs/heads/*:refs/remotes/origin/*",
    "+refs/tags/*:refs/tags/*",
];

/// Interpret a git2 error and provide a more user-friendly message
fn interpret_git_error(err: &git2::Error) -> String {
    let class = err.class();
    let message = err.message().to_lowercase();

    // More specific patterns first
    if message.contains("not found") || message.contains("404") {
        "Repository not found".to_string()
    } else if message.contains("authentication") || message.contains("credentials") {
        "Authentication failed".to_string()
    } else if message.contains("permission denied") || message.contains("access denied") {
        "Permission denied".to_string()
    } else if message.contains("connection")
        || message.contains("network")
        || message.contains("resolve")
        || message.contains("timed out")
    {
        format!("Network error: {}", err.message())
    } else if class == ErrorClass::Http {
        format!("HTTP error: {}", err.message())
    } else if class == ErrorClass::Ssh {
        format!("SSH error: {}", err.message())
    } else {
        err.message().to_string()
    }
}

fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);
    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

/// Clone `url` into `target` with full history so tags resolve
pub fn clone(url: &str, target: &Path) -> Result<Repository> {
    debug!(url, target = %target.display(), "cloning");
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options());
    builder
        .clone(url, target)
        .map_err(|e| InstallerError::FetchFailed {
            url: url.to_string(),
            reason: interpret_git_error(&e),
        })
}

/// Fetch all branches and tags from `origin`
pub fn fetch_origin(repo: &Repository) -> Result<()> {
    let mut remote = repo
        .find_remote("origin")
        .map_err(|e| InstallerError::SourceTreeCorrupted {
            path: workdir_display(repo),
            reason: e.message().to_string(),
        })?;
    let url = remote.url().unwrap_or("origin").to_string();
    debug!(url = %url, "fetching");

    remote
        .fetch(&FETCH_REFSPECS, Some(&mut fetch_options()), None)
        .map_err(|e| InstallerError::FetchFailed {
            url,
            reason: interpret_git_error(&e),
        })
}

/// Resolve a branch, tag, or SHA to a full SHA.
///
/// Remote-tracking branches are tried before local ones so an update picks up
/// what was just fetched.
pub fn resolve_ref(repo: &Repository, git_ref: &str) -> Result<String> {
    let candidates = [
        format!("refs/tags/{}", git_ref),
        format!("refs/remotes/origin/{}", git_ref),
        format!("refs/heads/{}", git_ref),
        git_ref.to_string(),
    ];

    for candidate in &candidates {
        if let Ok(reference) = repo.find_reference(candidate) {
            if let Ok(commit) = reference.peel_to_commit() {
                return Ok(commit.id().to_string());
            }
        }
    }

    if let Ok(obj) = repo.revparse_single(git_ref) {
        if let Ok(commit) = obj.peel_to_commit() {
            return Ok(commit.id().to_string());
        }
    }

    Err(InstallerError::FetchFailed {
        url: remote_url(repo),
        reason: format!("Could not resolve ref '{}'", git_ref),
    })
}

/// Detach HEAD at `sha` and force the working tree to match it
pub fn checkout_commit(repo: &Repository, sha: &str) -> Result<()> {
    let checkout_err = |e: git2::Error| InstallerError::SourceTreeCorrupted {
        path: workdir_display(repo),
        reason: format!("checkout of {} failed: {}", sha, e.message()),
    };

    let oid = git2::Oid::from_str(sha).map_err(checkout_err)?;
    let commit = repo.find_commit(oid).map_err(checkout_err)?;
    repo.set_head_detached(commit.id()).map_err(checkout_err)?;

    let mut checkout_builder = git2::build::CheckoutBuilder::new();
    checkout_builder.force();
    repo.checkout_head(Some(&mut checkout_builder))
        .map_err(checkout_err)
}

/// Open an existing repository
pub fn open(path: &Path) -> Result<Repository> {
    Repository::open(path).map_err(|e| InstallerError::SourceTreeCorrupted {
        path: path.display().to_string(),
        reason: e.message().to_string(),
    })
}

fn remote_url(repo: &Repository) -> String {
    repo.find_remote("origin")
        .ok()
        .and_then(|r| r.url().map(str::to_string))
        .unwrap_or_else(|| workdir_display(repo))
}

fn workdir_display(repo: &Repository) -> String {
    repo.workdir()
        .unwrap_or_else(|| repo.path())
        .display()
        .to_string()
}

/// Set up authentication callbacks for git operations
fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks) {
    callbacks.credentials(|url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Some(username) = username_from_url {
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }

                let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");
                for key_name in &["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let private_key = ssh_dir.join(key_name);
                    let public_key = ssh_dir.join(format!("{}.pub", key_name));
                    if private_key.exists() {
                        let public_key = public_key.exists().then_some(public_key.as_path());
                        if let Ok(cred) = Cred::ssh_key(username, public_key, &private_key, None)
                        {
                            return Ok(cred);
                        }
                    }
                }
            }
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Ok(config) = git2::Config::open_default() {
                if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
                    return Ok(cred);
                }
            }
            // Public HTTPS repositories: let the server give the real answer
            if let Ok(cred) = Cred::userpass_plaintext("", "") {
                return Ok(cred);
            }
        }

        Err(git2::Error::new(
            git2::ErrorCode::Auth,
            git2::ErrorClass::Http,
            "authentication failed",
        ))
    });
}
