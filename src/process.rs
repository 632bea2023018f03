//! External command execution
//!
//! Every external tool the CLI drives (`git`, `docker`, `java`) goes through
//! [`ExternalCommand`]. Captured invocations return a [`CommandOutput`]; failed
//! ones are turned into a [`ProcessError`] carrying stderr and a
//! [`FailureSignature`] so call sites can react to known failure modes without
//! re-parsing output themselves.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::debug;

/// Known failure modes recognised in external tool output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignature {
    /// The container daemon socket refused the current user
    DockerPermissionDenied,
    /// Remote rejected or could not obtain credentials
    AuthenticationFailed,
    /// Reference does not name a reachable repository
    RepositoryNotFound,
    /// DNS, connection or transport failure
    Network,
    Unknown,
}

impl FailureSignature {
    /// Classifies tool output, checking the most specific signatures first
    pub fn classify(output: &str) -> Self {
        let lowered = output.to_lowercase();

        if lowered.contains("permission denied") && lowered.contains("docker.sock") {
            return Self::DockerPermissionDenied;
        }

        if lowered.contains("authentication failed")
            || lowered.contains("could not read username")
            || lowered.contains("permission denied (publickey)")
            || lowered.contains("terminal prompts disabled")
        {
            return Self::AuthenticationFailed;
        }

        if lowered.contains("repository not found")
            || lowered.contains("does not appear to be a git repository")
            || lowered.contains("not a valid repository name")
            || (lowered.contains("remote branch") && lowered.contains("not found"))
        {
            return Self::RepositoryNotFound;
        }

        if lowered.contains("could not resolve host")
            || lowered.contains("connection refused")
            || lowered.contains("failed to connect")
            || lowered.contains("network is unreachable")
            || lowered.contains("connection timed out")
        {
            return Self::Network;
        }

        Self::Unknown
    }
}

impl fmt::Display for FailureSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DockerPermissionDenied => "docker permission denied",
            Self::AuthenticationFailed => "authentication failed",
            Self::RepositoryNotFound => "repository not found",
            Self::Network => "network failure",
            Self::Unknown => "unclassified failure",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("'{program}' command not found. Is it installed and in your PATH?")]
    NotFound { program: String },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' failed with exit code {}: {}", exit_label(.code), .stderr.trim())]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
        signature: FailureSignature,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl ProcessError {
    /// Signature of a failed invocation; spawn problems are `Unknown`
    pub fn signature(&self) -> FailureSignature {
        match self {
            ProcessError::Failed { signature, .. } => *signature,
            _ => FailureSignature::Unknown,
        }
    }

    pub fn stderr(&self) -> Option<&str> {
        match self {
            ProcessError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Builder for one invocation of an external program
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Command line for logs, with credential values masked
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().map(|a| redact_arg(a)));
        parts.join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    fn spawn_error(&self, err: io::Error) -> ProcessError {
        if err.kind() == io::ErrorKind::NotFound {
            ProcessError::NotFound {
                program: self.program.clone(),
            }
        } else {
            ProcessError::Spawn {
                program: self.program.clone(),
                source: err,
            }
        }
    }

    /// Runs to completion with stdout and stderr captured
    pub async fn output(&self) -> Result<CommandOutput, ProcessError> {
        debug!("Executing: {}", self.display());

        let output = self
            .to_command()
            .stdin(Stdio::null())
            // Dropping the future (interrupt) kills the child.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Runs to completion and converts a non-zero exit into a classified error
    pub async fn run_checked(&self) -> Result<CommandOutput, ProcessError> {
        let output = self.output().await?;
        if output.success() {
            return Ok(output);
        }

        Err(ProcessError::Failed {
            command: self.display(),
            code: output.code,
            signature: FailureSignature::classify(&output.stderr),
            stderr: output.stderr,
        })
    }

    /// Starts the program attached to the terminal.
    ///
    /// The child is killed if the returned handle is dropped before it exits.
    pub fn spawn_attached(&self) -> Result<Child, ProcessError> {
        debug!("Spawning: {}", self.display());

        self.to_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))
    }

    /// Converts the exit status of an attached run into a result
    pub fn check_status(&self, status: ExitStatus) -> Result<(), ProcessError> {
        if status.success() {
            return Ok(());
        }
        Err(ProcessError::Failed {
            command: self.display(),
            code: status.code(),
            stderr: String::new(),
            signature: FailureSignature::Unknown,
        })
    }
}

fn redact_arg(arg: &str) -> String {
    match arg.split_once('=') {
        Some((key, _)) if is_secret_key(key) => format!("{}=****", key),
        _ => arg.to_string(),
    }
}

fn is_secret_key(key: &str) -> bool {
    let upper = key.to_uppercase();
    upper.ends_with("_KEY") || upper.ends_with("_TOKEN") || upper.ends_with("_SECRET")
}
