//! Fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use coral_cli::coralizer::{ContainerEngine, RunSpec, VersionControl};
use coral_cli::process::{CommandOutput, FailureSignature, ProcessError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Populates the clone destination with a fixed set of files
pub struct FixtureGit {
    files: Vec<(&'static str, &'static str)>,
    /// Time the clone keeps running after the files are written
    delay: Option<Duration>,
    pub destinations: Mutex<Vec<PathBuf>>,
}

impl FixtureGit {
    pub fn new(files: &[(&'static str, &'static str)]) -> Self {
        Self {
            files: files.to_vec(),
            delay: None,
            destinations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl VersionControl for FixtureGit {
    async fn clone_repo(&self, _reference: &str, _branch: Option<&str>, destination: &Path) -> Result<(), ProcessError> {
        self.destinations.lock().unwrap().push(destination.to_path_buf());
        for (path, contents) in &self.files {
            let target = destination.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(target, contents).unwrap();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

/// Fails every clone with the given stderr
pub struct RejectingGit(pub &'static str);

#[async_trait]
impl VersionControl for RejectingGit {
    async fn clone_repo(&self, reference: &str, _branch: Option<&str>, _destination: &Path) -> Result<(), ProcessError> {
        Err(ProcessError::Failed {
            command: format!("git clone -- {}", reference),
            code: Some(128),
            stderr: self.0.to_string(),
            signature: FailureSignature::classify(self.0),
        })
    }
}

/// Records engine calls; builds fail with `build_stderr` when set and
/// `run` never returns when `hang_on_run` is set
#[derive(Default)]
pub struct RecordingEngine {
    pub build_stderr: Option<&'static str>,
    pub hang_on_run: bool,
    pub calls: Mutex<Vec<String>>,
    pub dockerfiles: Mutex<Vec<String>>,
    pub wrappers: Mutex<Vec<String>>,
    pub run_specs: Mutex<Vec<RunSpec>>,
}

impl RecordingEngine {
    pub fn failing_build(stderr: &'static str) -> Self {
        Self {
            build_stderr: Some(stderr),
            ..Default::default()
        }
    }

    pub fn hanging_run() -> Self {
        Self {
            hang_on_run: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerEngine for RecordingEngine {
    async fn build(&self, context_dir: &Path, dockerfile: &Path, tag: &str) -> Result<CommandOutput, ProcessError> {
        self.calls.lock().unwrap().push(format!("build {}", tag));
        self.dockerfiles
            .lock()
            .unwrap()
            .push(fs::read_to_string(dockerfile).unwrap());
        self.wrappers
            .lock()
            .unwrap()
            .push(fs::read_to_string(context_dir.join("coral_wrapper.py")).unwrap());

        match self.build_stderr {
            Some(stderr) => Err(ProcessError::Failed {
                command: format!("docker build -t {}", tag),
                code: Some(1),
                stderr: stderr.to_string(),
                signature: FailureSignature::classify(stderr),
            }),
            None => Ok(CommandOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            }),
        }
    }

    async fn run(&self, spec: &RunSpec) -> Result<(), ProcessError> {
        self.calls.lock().unwrap().push(format!("run {}", spec.name));
        self.run_specs.lock().unwrap().push(spec.clone());
        if self.hang_on_run {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<(), ProcessError> {
        self.calls.lock().unwrap().push(format!("stop {}", name));
        Ok(())
    }
}

/// Entries left in `dir`
pub fn leftover_entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
