//! Errors raised while coralizing a repository or MCP server

use crate::llm::BackendError;
use crate::process::ProcessError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while obtaining the source repository
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Invalid repository reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Network failure while cloning '{reference}': {details}")]
    Network { reference: String, details: String },

    #[error("Authentication failed for '{reference}': {details}")]
    Authentication { reference: String, details: String },

    #[error("Failed to clone '{reference}': {details}")]
    CloneFailed { reference: String, details: String },

    #[error("Version control tool unavailable: {0}")]
    ToolUnavailable(#[source] ProcessError),

    #[error("Failed to create working directory: {0}")]
    Workspace(#[source] io::Error),
}

impl AcquisitionError {
    /// Maps a failed clone onto the acquisition taxonomy using its stderr signature
    pub fn from_clone_failure(reference: &str, err: ProcessError) -> Self {
        use crate::process::FailureSignature;

        let details = err
            .stderr()
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| err.to_string());
        let reference = reference.to_string();

        if !matches!(err, ProcessError::Failed { .. }) {
            return AcquisitionError::ToolUnavailable(err);
        }

        match err.signature() {
            FailureSignature::Network => AcquisitionError::Network { reference, details },
            FailureSignature::AuthenticationFailed => {
                AcquisitionError::Authentication { reference, details }
            }
            FailureSignature::RepositoryNotFound => AcquisitionError::InvalidReference {
                reference,
                reason: details,
            },
            _ => AcquisitionError::CloneFailed { reference, details },
        }
    }
}

/// Failures while generating the wrapper script
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation agent request failed: {0}")]
    Agent(#[from] BackendError),

    /// Response held neither a fenced python block nor recognisable wrapper code
    #[error("Could not parse Python code from the agent's response")]
    Unparsable { raw_response: String },
}

/// Top-level failure of a coralization run
///
/// Interruption by the operator is not represented here; it is a normal
/// [`BuildRunOutcome`](super::orchestrator::BuildRunOutcome).
#[derive(Debug, Error)]
pub enum CoralizeError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{var} environment variable is not set")]
    MissingCredential { var: &'static str },

    #[error("Failed to create working directory: {0}")]
    Workspace(#[source] io::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Docker build failed: the current user cannot access the Docker daemon socket")]
    BuildPermission { stderr: String },

    #[error("Docker build failed: {0}")]
    Build(#[source] ProcessError),

    #[error("Docker run failed: {0}")]
    Run(#[source] ProcessError),
}

impl CoralizeError {
    /// Returns a user-facing message with remediation hints
    pub fn help_message(&self) -> String {
        match self {
            CoralizeError::BuildPermission { .. } => "Error: Docker permission error detected\n\n\
                The current user does not have permission to access the Docker daemon socket.\n\
                On Linux, try adding your user to the 'docker' group:\n  \
                1. Run: sudo usermod -aG docker $USER\n  \
                2. Log out and log back in, or run: newgrp docker\n\n\
                Then run the coral command again."
                .to_string(),
            CoralizeError::Build(ProcessError::NotFound { .. })
            | CoralizeError::Run(ProcessError::NotFound { .. }) => {
                "Error: 'docker' command not found\n\n\
                Help: Install Docker and make sure it is on your PATH, or use --dry-run \
                to write the generated files without building."
                    .to_string()
            }
            CoralizeError::Build(err) => {
                let stderr = err.stderr().unwrap_or_default();
                format!(
                    "Error: Docker image build failed\n\n{}\n\n\
                    Help: The generated Dockerfile may need manual adjustment for this \
                    repository. Re-run with --dry-run to inspect it.",
                    if stderr.trim().is_empty() {
                        err.to_string()
                    } else {
                        stderr.trim().to_string()
                    }
                )
            }
            CoralizeError::Run(err) => format!("Error: Docker container exited with an error\n\nDetails: {}", err),
            CoralizeError::MissingCredential { var } => format!(
                "Error: {var} is not set\n\n\
                Help: The generation agent and the wrapped agent both need it:\n\
                export {var}=your-key-here"
            ),
            CoralizeError::Acquisition(AcquisitionError::Authentication { reference, details }) => {
                format!(
                    "Error: Could not authenticate to {}\n\n\
                    Help: Private repositories need git credentials configured \
                    (credential helper or SSH key).\n\nDetails: {}",
                    reference, details
                )
            }
            CoralizeError::Acquisition(AcquisitionError::ToolUnavailable(_)) => {
                "Error: 'git' command not found\n\nHelp: Install git and make sure it is on your PATH."
                    .to_string()
            }
            CoralizeError::Acquisition(err) => format!(
                "Error: Failed to clone repository\n\n\
                Help: Check that the URL and branch exist and that you are online.\n\n\
                Details: {}",
                err
            ),
            CoralizeError::Generation(GenerationError::Unparsable { raw_response }) => format!(
                "Error: Could not parse Python code from the agent's response.\n\
                --- Agent Response ---\n{}\n--- End Agent Response ---",
                raw_response
            ),
            CoralizeError::Generation(GenerationError::Agent(err)) => format!(
                "Error: Wrapper generation failed\n\n\
                Help: Check CORAL_PROVIDER, CORAL_MODEL and the provider API key.\n\n\
                Details: {}",
                err
            ),
            CoralizeError::Workspace(err) => format!("Error: Failed to create working directory: {}", err),
            CoralizeError::ArtifactWrite { .. } => format!("Error: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::FailureSignature;

    fn failed(stderr: &str) -> ProcessError {
        ProcessError::Failed {
            command: "git clone https://example.invalid/repo".to_string(),
            code: Some(128),
            stderr: stderr.to_string(),
            signature: FailureSignature::classify(stderr),
        }
    }

    #[test]
    fn test_clone_failure_mapping() {
        let network = AcquisitionError::from_clone_failure(
            "https://example.invalid/repo",
            failed("Could not resolve host: example.invalid"),
        );
        assert!(matches!(network, AcquisitionError::Network { .. }));

        let auth = AcquisitionError::from_clone_failure(
            "https://github.com/org/private",
            failed("fatal: Authentication failed for 'https://github.com/org/private/'"),
        );
        assert!(matches!(auth, AcquisitionError::Authentication { .. }));

        let missing = AcquisitionError::from_clone_failure(
            "https://github.com/org/missing",
            failed("remote: Repository not found."),
        );
        assert!(matches!(missing, AcquisitionError::InvalidReference { .. }));

        let other = AcquisitionError::from_clone_failure("x", failed("disk full"));
        assert!(matches!(other, AcquisitionError::CloneFailed { ref details, .. } if details == "disk full"));
    }

    #[test]
    fn test_missing_git_is_tool_unavailable() {
        let err = AcquisitionError::from_clone_failure(
            "https://github.com/org/repo",
            ProcessError::NotFound {
                program: "git".to_string(),
            },
        );
        assert!(matches!(err, AcquisitionError::ToolUnavailable(_)));
    }

    #[test]
    fn test_permission_help_has_remediation() {
        let err = CoralizeError::BuildPermission {
            stderr: "permission denied ... docker.sock".to_string(),
        };
        let help = err.help_message();
        assert!(help.contains("sudo usermod -aG docker $USER"));
        assert!(help.contains("newgrp docker"));
    }

    #[test]
    fn test_unclassified_build_help_shows_stderr() {
        let err = CoralizeError::Build(failed("Step 4/7 : RUN pip install\nERROR: No matching distribution"));
        assert!(err.help_message().contains("No matching distribution"));
    }

    #[test]
    fn test_unparsable_help_shows_raw_response() {
        let err = CoralizeError::from(GenerationError::Unparsable {
            raw_response: "I cannot help with that".to_string(),
        });
        let help = err.help_message();
        assert!(help.contains("--- Agent Response ---"));
        assert!(help.contains("I cannot help with that"));
    }
}
