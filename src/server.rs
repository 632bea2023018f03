//! Chatroom server launcher
//!
//! Runs the Coral server in the foreground either from a local jar or from a
//! container image. An interrupt terminates the child; in container mode the
//! container is also stopped by name.

use crate::coralizer::{ContainerEngine, Orchestrator, RunSpec};
use crate::process::{ExternalCommand, ProcessError};
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_SERVER_PORT: u16 = 3001;
pub const DEFAULT_SERVER_NAME: &str = "coral-server";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server jar not found: {}", .0.display())]
    JarNotFound(PathBuf),

    #[error("Coral server failed: {0}")]
    Process(#[from] ProcessError),
}

impl ServerError {
    pub fn help_message(&self) -> String {
        match self {
            ServerError::JarNotFound(path) => format!(
                "Error: {} does not exist\n\nHelp: Pass the path of a built coral-server jar with --jar, \
                 or use --image to run the server in a container.",
                path.display()
            ),
            ServerError::Process(ProcessError::NotFound { program }) => format!(
                "Error: '{}' command not found\n\nHelp: Install it and make sure it is on your PATH.",
                program
            ),
            ServerError::Process(err) => format!("Error: {}", err),
        }
    }
}

/// How to start the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLaunch {
    Jar(PathBuf),
    Image { image: String, port: u16, name: String },
}

/// How a foreground server run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerExit {
    Exited,
    Interrupted,
}

impl ServerExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            ServerExit::Exited => 0,
            ServerExit::Interrupted => 130,
        }
    }
}

impl ServerLaunch {
    pub fn java_command(path: &std::path::Path) -> ExternalCommand {
        ExternalCommand::new("java")
            .arg("-jar")
            .arg(path.to_string_lossy().into_owned())
    }

    pub fn run_spec(image: &str, port: u16, name: &str) -> RunSpec {
        RunSpec::new(image, name).publish(port, port)
    }

    /// Runs the server until it exits or `interrupt` resolves
    pub async fn run<F>(&self, engine: &dyn ContainerEngine, interrupt: F) -> Result<ServerExit, ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        match self {
            ServerLaunch::Jar(path) => {
                if !path.is_file() {
                    return Err(ServerError::JarNotFound(path.clone()));
                }
                let cmd = Self::java_command(path);
                info!(jar = %path.display(), "Starting Coral server");
                let mut child = cmd.spawn_attached()?;

                tokio::select! {
                    status = child.wait() => {
                        let status = status.map_err(|source| ProcessError::Spawn {
                            program: cmd.program().to_string(),
                            source,
                        })?;
                        cmd.check_status(status)?;
                        info!("Coral server exited");
                        Ok(ServerExit::Exited)
                    }
                    _ = &mut interrupt => {
                        info!("Stopping Coral server");
                        if let Err(e) = child.kill().await {
                            warn!("Failed to terminate server process: {}", e);
                        }
                        Ok(ServerExit::Interrupted)
                    }
                }
            }
            ServerLaunch::Image { image, port, name } => {
                let spec = Self::run_spec(image, *port, name);
                info!(image = %image, port = *port, "Starting Coral server container");

                tokio::select! {
                    result = engine.run(&spec) => {
                        result?;
                        info!("Coral server container exited");
                        Ok(ServerExit::Exited)
                    }
                    _ = &mut interrupt => {
                        Orchestrator::new(engine).stop_best_effort(name).await;
                        Ok(ServerExit::Interrupted)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct BlockingEngine {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContainerEngine for BlockingEngine {
        async fn build(&self, _c: &Path, _d: &Path, _t: &str) -> Result<CommandOutput, ProcessError> {
            unreachable!("server never builds")
        }

        async fn run(&self, spec: &RunSpec) -> Result<(), ProcessError> {
            self.calls.lock().unwrap().push(format!("run {} {:?}", spec.image, spec.ports));
            std::future::pending().await
        }

        async fn stop(&self, name: &str) -> Result<(), ProcessError> {
            self.calls.lock().unwrap().push(format!("stop {}", name));
            Ok(())
        }
    }

    #[test]
    fn test_java_command() {
        let cmd = ServerLaunch::java_command(Path::new("/opt/coral-server.jar"));
        assert_eq!(cmd.program(), "java");
        assert_eq!(cmd.get_args(), &["-jar", "/opt/coral-server.jar"]);
    }

    #[tokio::test]
    async fn test_missing_jar() {
        let dir = TempDir::new().unwrap();
        let launch = ServerLaunch::Jar(dir.path().join("missing.jar"));

        let err = launch
            .run(&BlockingEngine::default(), std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::JarNotFound(_)));
        assert!(err.help_message().contains("--image"));
    }

    #[tokio::test]
    async fn test_interrupt_stops_container() {
        let engine = BlockingEngine::default();
        let launch = ServerLaunch::Image {
            image: "coralprotocol/coral-server".to_string(),
            port: DEFAULT_SERVER_PORT,
            name: DEFAULT_SERVER_NAME.to_string(),
        };

        let exit = launch
            .run(&engine, tokio::time::sleep(Duration::from_millis(20)))
            .await
            .unwrap();

        assert_eq!(exit, ServerExit::Interrupted);
        assert_eq!(exit.exit_code(), 130);
        assert_eq!(
            *engine.calls.lock().unwrap(),
            vec![
                "run coralprotocol/coral-server [(3001, 3001)]".to_string(),
                "stop coral-server".to_string(),
            ]
        );
    }
}
