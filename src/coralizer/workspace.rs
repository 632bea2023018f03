//! Ephemeral working directory and its cleanup
//!
//! A [`WorkingDirectory`] is created with a unique name under the system temp
//! directory and is owned by exactly one coralization run. Removal is
//! idempotent and retried on transient failures; it happens explicitly through
//! [`WorkingDirectory::cleanup_async`] (or the blocking [`WorkingDirectory::cleanup`])
//! or, as a last resort, when the value is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Retry policy for removing a working directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    /// Total removal attempts, including the first
    pub attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Result of a cleanup pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed,
    /// Nothing to do; the directory was already gone
    AlreadyAbsent,
    /// Every attempt failed; the directory was left on disk
    Abandoned { attempts: u32, last_error: String },
}

impl CleanupOutcome {
    pub fn is_clean(&self) -> bool {
        !matches!(self, CleanupOutcome::Abandoned { .. })
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::Interrupted
            | io::ErrorKind::Other
    )
}

/// One removal attempt; `None` means the failure is transient and worth retrying.
fn try_remove(path: &Path, attempt: u32, attempts: u32, policy: CleanupPolicy) -> Option<CleanupOutcome> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            info!("Cleaned up temporary directory: {}", path.display());
            Some(CleanupOutcome::Removed)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Temporary directory already removed: {}", path.display());
            Some(CleanupOutcome::AlreadyAbsent)
        }
        Err(e) if is_transient(&e) && attempt < attempts => {
            warn!(
                "Could not remove {} (attempt {}/{}): {}; retrying in {:?}",
                path.display(),
                attempt,
                attempts,
                e,
                policy.delay
            );
            None
        }
        Err(e) => {
            warn!(
                "Failed to clean up temporary directory {} after {} attempt(s): {}",
                path.display(),
                attempt,
                e
            );
            Some(CleanupOutcome::Abandoned {
                attempts: attempt,
                last_error: e.to_string(),
            })
        }
    }
}

/// Removes `path` recursively, retrying transient failures per `policy`.
///
/// Never returns an error: a directory that cannot be removed is reported as
/// [`CleanupOutcome::Abandoned`] and a warning is logged. Blocks the calling
/// thread between attempts; async callers use [`remove_dir_with_retry_async`].
pub fn remove_dir_with_retry(path: &Path, policy: CleanupPolicy) -> CleanupOutcome {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        if let Some(outcome) = try_remove(path, attempt, attempts, policy) {
            return outcome;
        }
        thread::sleep(policy.delay);
        attempt += 1;
    }
}

/// Same as [`remove_dir_with_retry`], but waits on the tokio timer between attempts
pub async fn remove_dir_with_retry_async(path: &Path, policy: CleanupPolicy) -> CleanupOutcome {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        if let Some(outcome) = try_remove(path, attempt, attempts, policy) {
            return outcome;
        }
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}

/// Uniquely-named scratch directory owned by a single coralization run
#[derive(Debug)]
pub struct WorkingDirectory {
    path: PathBuf,
    policy: CleanupPolicy,
    outcome: Option<CleanupOutcome>,
}

impl WorkingDirectory {
    /// Creates `<temp>/<prefix><uuid>`; creation fails rather than reusing an existing path.
    pub fn create(prefix: &str, policy: CleanupPolicy) -> io::Result<Self> {
        Self::create_in(&std::env::temp_dir(), prefix, policy)
    }

    pub fn create_in(parent: &Path, prefix: &str, policy: CleanupPolicy) -> io::Result<Self> {
        let path = parent.join(format!("{}{}", prefix, Uuid::new_v4().simple()));
        fs::create_dir(&path)?;
        debug!("Created working directory {}", path.display());

        Ok(Self {
            path,
            policy,
            outcome: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the directory itself (last path component)
    pub fn dir_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_cleaned(&self) -> bool {
        self.outcome.is_some()
    }

    /// Removes the directory; later calls return the first outcome unchanged.
    pub fn cleanup(&mut self) -> CleanupOutcome {
        if let Some(ref outcome) = self.outcome {
            return outcome.clone();
        }
        let outcome = remove_dir_with_retry(&self.path, self.policy);
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Async form of [`WorkingDirectory::cleanup`] for use inside the runtime
    pub async fn cleanup_async(&mut self) -> CleanupOutcome {
        if let Some(ref outcome) = self.outcome {
            return outcome.clone();
        }
        let outcome = remove_dir_with_retry_async(&self.path, self.policy).await;
        self.outcome = Some(outcome.clone());
        outcome
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        if self.outcome.is_none() {
            self.cleanup();
        }
    }
}
