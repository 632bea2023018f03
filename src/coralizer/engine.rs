//! Container engine abstraction
//!
//! The pipeline needs three container operations: build an image, run it in
//! the foreground and stop it by name. [`DockerCli`] implements them with the
//! `docker` executable; tests substitute scripted engines.

use crate::process::{CommandOutput, ExternalCommand, ProcessError};
use async_trait::async_trait;
use std::path::Path;

/// Foreground container invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub name: String,
    pub env: Vec<(String, String)>,
    /// `--network=<mode>`; `None` keeps the engine default
    pub network: Option<String>,
    /// Host to container port mappings
    pub ports: Vec<(u16, u16)>,
}

impl RunSpec {
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn network(mut self, mode: impl Into<String>) -> Self {
        self.network = Some(mode.into());
        self
    }

    pub fn publish(mut self, host: u16, container: u16) -> Self {
        self.ports.push((host, container));
        self
    }
}

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Builds `tag` from `context_dir`; failures carry the captured stderr
    async fn build(&self, context_dir: &Path, dockerfile: &Path, tag: &str) -> Result<CommandOutput, ProcessError>;

    /// Runs attached until the container exits. Dropping the future terminates
    /// the local client process.
    async fn run(&self, spec: &RunSpec) -> Result<(), ProcessError>;

    async fn stop(&self, name: &str) -> Result<(), ProcessError>;
}

/// `docker` executable driven as an external command
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn build_command(&self, context_dir: &Path, dockerfile: &Path, tag: &str) -> ExternalCommand {
        ExternalCommand::new(&self.program)
            .args(["build", "-t", tag, "-f"])
            .arg(dockerfile.to_string_lossy().into_owned())
            .arg(".")
            .current_dir(context_dir)
    }

    pub fn run_command(&self, spec: &RunSpec) -> ExternalCommand {
        let mut cmd = ExternalCommand::new(&self.program).args(["run", "--rm"]);
        for (key, value) in &spec.env {
            cmd = cmd.arg("-e").arg(format!("{}={}", key, value));
        }
        for (host, container) in &spec.ports {
            cmd = cmd.arg("-p").arg(format!("{}:{}", host, container));
        }
        if let Some(ref mode) = spec.network {
            cmd = cmd.arg(format!("--network={}", mode));
        }
        cmd.args(["--name", spec.name.as_str(), spec.image.as_str()])
    }

    pub fn stop_command(&self, name: &str) -> ExternalCommand {
        ExternalCommand::new(&self.program).args(["stop", name])
    }
}

#[async_trait]
impl ContainerEngine for DockerCli {
    async fn build(&self, context_dir: &Path, dockerfile: &Path, tag: &str) -> Result<CommandOutput, ProcessError> {
        self.build_command(context_dir, dockerfile, tag).run_checked().await
    }

    async fn run(&self, spec: &RunSpec) -> Result<(), ProcessError> {
        let cmd = self.run_command(spec);
        let mut child = cmd.spawn_attached()?;
        let status = child.wait().await.map_err(|source| ProcessError::Spawn {
            program: cmd.program().to_string(),
            source,
        })?;
        cmd.check_status(status)
    }

    async fn stop(&self, name: &str) -> Result<(), ProcessError> {
        self.stop_command(name).run_checked().await.map(|_| ())
    }
}
