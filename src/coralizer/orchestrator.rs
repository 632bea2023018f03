//! Build and run of generated artifacts
//!
//! Writes the artifact pair into the build context, builds the image and runs
//! it in the foreground. The operator interrupt is watched during both the
//! build and the run; interrupting a run also issues a best-effort `stop` for
//! the named container.

use super::engine::{ContainerEngine, RunSpec};
use super::error::CoralizeError;
use crate::config::WRAPPER_FILE_NAME;
use crate::process::{FailureSignature, ProcessError};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Upper bound on the best-effort stop after an interrupt
const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Wrapper source and Dockerfile; both non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub wrapper: String,
    pub dockerfile: String,
}

impl GeneratedArtifacts {
    pub fn new(wrapper: impl Into<String>, dockerfile: impl Into<String>) -> Self {
        Self {
            wrapper: wrapper.into(),
            dockerfile: dockerfile.into(),
        }
    }

    /// Writes `coral_wrapper.py` and `Dockerfile` into `dir`, returning their paths
    pub fn write_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf), CoralizeError> {
        let wrapper_path = dir.join(WRAPPER_FILE_NAME);
        let dockerfile_path = dir.join(DOCKERFILE_NAME);

        for (path, contents) in [(&wrapper_path, &self.wrapper), (&dockerfile_path, &self.dockerfile)] {
            debug!(file = %path.display(), bytes = contents.len(), "Writing artifact");
            fs::write(path, contents).map_err(|source| CoralizeError::ArtifactWrite {
                path: path.clone(),
                source,
            })?;
        }

        Ok((wrapper_path, dockerfile_path))
    }
}

/// Why an image build failed
#[derive(Debug)]
pub enum BuildFailure {
    /// The daemon socket refused the current user
    Permission { stderr: String },
    Unclassified(ProcessError),
}

impl BuildFailure {
    pub fn classify(err: ProcessError) -> Self {
        match err {
            ProcessError::Failed {
                signature: FailureSignature::DockerPermissionDenied,
                stderr,
                ..
            } => BuildFailure::Permission { stderr },
            other => BuildFailure::Unclassified(other),
        }
    }
}

impl From<BuildFailure> for CoralizeError {
    fn from(failure: BuildFailure) -> Self {
        match failure {
            BuildFailure::Permission { stderr } => CoralizeError::BuildPermission { stderr },
            BuildFailure::Unclassified(err) => CoralizeError::Build(err),
        }
    }
}

/// Result of the build and run phases
#[derive(Debug)]
pub enum BuildRunOutcome {
    /// The container ran and exited cleanly
    Success,
    BuildFailure(BuildFailure),
    RunFailure(ProcessError),
    /// Operator interrupt; not a fault
    UserInterrupted,
}

impl BuildRunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildRunOutcome::Success => 0,
            BuildRunOutcome::UserInterrupted => 130,
            BuildRunOutcome::BuildFailure(_) | BuildRunOutcome::RunFailure(_) => 1,
        }
    }

    /// Converts fatal outcomes into an error; `Ok(true)` means interrupted
    pub fn into_result(self) -> Result<bool, CoralizeError> {
        match self {
            BuildRunOutcome::Success => Ok(false),
            BuildRunOutcome::UserInterrupted => Ok(true),
            BuildRunOutcome::BuildFailure(failure) => Err(failure.into()),
            BuildRunOutcome::RunFailure(err) => Err(CoralizeError::Run(err)),
        }
    }
}

/// Drives a container engine through build, run and stop
pub struct Orchestrator<'a> {
    engine: &'a dyn ContainerEngine,
}

impl<'a> Orchestrator<'a> {
    pub fn new(engine: &'a dyn ContainerEngine) -> Self {
        Self { engine }
    }

    /// Writes `artifacts` into `context_dir`, builds `spec.image` and runs it.
    ///
    /// `interrupt` resolves when the operator asks to stop. Only failing to
    /// write the artifacts is an error; every other result is an outcome.
    pub async fn build_and_run<F>(
        &self,
        context_dir: &Path,
        artifacts: &GeneratedArtifacts,
        spec: &RunSpec,
        interrupt: F,
    ) -> Result<BuildRunOutcome, CoralizeError>
    where
        F: Future<Output = ()>,
    {
        let (_, dockerfile_path) = artifacts.write_to(context_dir)?;
        tokio::pin!(interrupt);

        info!(image = %spec.image, context = %context_dir.display(), "Building Docker image");
        let build = tokio::select! {
            result = self.engine.build(context_dir, &dockerfile_path, &spec.image) => result,
            _ = &mut interrupt => {
                warn!("Interrupted during image build");
                return Ok(BuildRunOutcome::UserInterrupted);
            }
        };

        if let Err(err) = build {
            let failure = BuildFailure::classify(err);
            match failure {
                BuildFailure::Permission { .. } => error!("Docker permission error detected"),
                BuildFailure::Unclassified(ref e) => error!("Error building Docker image: {}", e),
            }
            return Ok(BuildRunOutcome::BuildFailure(failure));
        }
        info!(image = %spec.image, "Docker image built successfully");

        info!(
            container = %spec.name,
            network = spec.network.as_deref().unwrap_or("default"),
            "Running Docker container; press Ctrl+C to stop it"
        );
        tokio::select! {
            result = self.engine.run(spec) => match result {
                Ok(()) => {
                    info!(container = %spec.name, "Container exited");
                    Ok(BuildRunOutcome::Success)
                }
                Err(e) => {
                    error!("Error running Docker container: {}", e);
                    Ok(BuildRunOutcome::RunFailure(e))
                }
            },
            _ = &mut interrupt => {
                self.stop_best_effort(&spec.name).await;
                Ok(BuildRunOutcome::UserInterrupted)
            }
        }
    }

    /// Issues `stop` for `name`, logging rather than returning any failure
    pub async fn stop_best_effort(&self, name: &str) {
        info!(container = %name, "Stopping Docker container");
        match tokio::time::timeout(STOP_TIMEOUT, self.engine.stop(name)).await {
            Ok(Ok(())) => info!(container = %name, "Container stop command issued"),
            Ok(Err(e)) => debug!(container = %name, "Container stop failed: {}", e),
            Err(_) => warn!(container = %name, "Container stop timed out after {:?}", STOP_TIMEOUT),
        }
    }
}
