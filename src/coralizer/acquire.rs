//! Repository acquisition
//!
//! Clones the source repository into a fresh [`WorkingDirectory`]. The
//! directory is removed before any acquisition error is returned, so callers
//! only ever own a populated directory.

use super::error::AcquisitionError;
use super::request::SourceReference;
use super::workspace::{CleanupPolicy, WorkingDirectory};
use crate::process::{ExternalCommand, ProcessError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Prefix of every clone directory under the temp dir
pub const WORKDIR_PREFIX: &str = "coral_git_";

/// Version control capability used by the acquirer
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clones `reference` into the existing, empty `destination`
    async fn clone_repo(
        &self,
        reference: &str,
        branch: Option<&str>,
        destination: &Path,
    ) -> Result<(), ProcessError>;
}

/// `git` executable driven as an external command
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn clone_command(&self, reference: &str, branch: Option<&str>, destination: &Path) -> ExternalCommand {
        let mut cmd = ExternalCommand::new(&self.program)
            .arg("clone")
            // Fail instead of blocking on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0");
        if let Some(branch) = branch {
            cmd = cmd.args(["--branch", branch]);
        }
        cmd.arg("--")
            .arg(reference)
            .arg(destination.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn clone_repo(
        &self,
        reference: &str,
        branch: Option<&str>,
        destination: &Path,
    ) -> Result<(), ProcessError> {
        self.clone_command(reference, branch, destination)
            .run_checked()
            .await
            .map(|_| ())
    }
}

/// Produces populated working directories from source references
pub struct RepositoryAcquirer {
    vcs: Arc<dyn VersionControl>,
    policy: CleanupPolicy,
    parent: Option<PathBuf>,
}

impl RepositoryAcquirer {
    pub fn new(vcs: Arc<dyn VersionControl>, policy: CleanupPolicy) -> Self {
        Self {
            vcs,
            policy,
            parent: None,
        }
    }

    /// Places working directories under `parent` instead of the system temp dir
    pub fn with_parent_dir(mut self, parent: impl Into<PathBuf>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub async fn acquire(&self, source: &SourceReference) -> Result<WorkingDirectory, AcquisitionError> {
        validate_reference(source)?;

        let mut workdir = match self.parent {
            Some(ref parent) => WorkingDirectory::create_in(parent, WORKDIR_PREFIX, self.policy),
            None => WorkingDirectory::create(WORKDIR_PREFIX, self.policy),
        }
        .map_err(AcquisitionError::Workspace)?;

        info!(
            repo = %source.url,
            branch = source.branch.as_deref().unwrap_or("default"),
            "Cloning {} into {}",
            source.url,
            workdir.path().display()
        );

        match self
            .vcs
            .clone_repo(&source.url, source.branch.as_deref(), workdir.path())
            .await
        {
            Ok(()) => {
                info!("Repository cloned successfully");
                Ok(workdir)
            }
            Err(e) => {
                warn!(repo = %source.url, error = %e, "Clone failed");
                workdir.cleanup_async().await;
                Err(AcquisitionError::from_clone_failure(&source.url, e))
            }
        }
    }
}

fn validate_reference(source: &SourceReference) -> Result<(), AcquisitionError> {
    let invalid = |reason: &str| AcquisitionError::InvalidReference {
        reference: source.url.clone(),
        reason: reason.to_string(),
    };

    let url = source.url.trim();
    if url.is_empty() {
        return Err(invalid("repository URL is empty"));
    }
    if url.starts_with('-') {
        return Err(invalid("repository URL must not start with '-'"));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(invalid("repository URL must not contain whitespace"));
    }
    if let Some(ref branch) = source.branch {
        if branch.trim().is_empty() || branch.starts_with('-') {
            return Err(invalid("branch name is not valid"));
        }
    }
    Ok(())
}
