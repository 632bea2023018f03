//! Repository coralization pipeline
//!
//! Acquire → scan → select → assemble → generate → synthesize → build/run,
//! with cleanup of the working directory on every exit path. Each stage is
//! reported to the configured [`ProgressHandler`].

use super::acquire::{RepositoryAcquirer, VersionControl};
use super::context::ContextAssembler;
use super::dockerfile::synthesize_dockerfile;
use super::engine::{ContainerEngine, RunSpec};
use super::error::CoralizeError;
use super::generator::WrapperGenerator;
use super::orchestrator::{BuildRunOutcome, GeneratedArtifacts, Orchestrator};
use super::prompt::PromptContext;
use super::request::CoralizationRequest;
use super::scanner::{scan_structure, TRUNCATION_MARKER};
use super::selector::EntryPointSelector;
use super::workspace::{CleanupPolicy, WorkingDirectory};
use crate::config::{CoralConfig, API_KEY_ENV};
use crate::llm::LLMClient;
use crate::progress::{NoOpHandler, Phase, ProgressEvent, ProgressHandler};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Budgets and cleanup behaviour for one pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_tree_chars: usize,
    pub max_code_context_chars: usize,
    pub cleanup: CleanupPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_tree_chars: 2000,
            max_code_context_chars: 15000,
            cleanup: CleanupPolicy::default(),
        }
    }
}

impl From<&CoralConfig> for PipelineSettings {
    fn from(config: &CoralConfig) -> Self {
        Self {
            max_tree_chars: config.max_tree_chars,
            max_code_context_chars: config.max_code_context_chars,
            cleanup: config.cleanup_policy(),
        }
    }
}

/// Artifacts generated inside a still-existing working directory
#[derive(Debug)]
pub struct PreparedCoralization {
    pub workdir: WorkingDirectory,
    pub artifacts: GeneratedArtifacts,
    pub candidates: Vec<String>,
    pub context_files: Vec<String>,
}

pub struct CoralizationPipeline {
    client: Arc<dyn LLMClient>,
    vcs: Arc<dyn VersionControl>,
    engine: Arc<dyn ContainerEngine>,
    settings: PipelineSettings,
    progress: Arc<dyn ProgressHandler>,
    workdir_parent: Option<PathBuf>,
}

impl CoralizationPipeline {
    pub fn new(
        client: Arc<dyn LLMClient>,
        vcs: Arc<dyn VersionControl>,
        engine: Arc<dyn ContainerEngine>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            client,
            vcs,
            engine,
            settings,
            progress: Arc::new(NoOpHandler),
            workdir_parent: None,
        }
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = handler;
        self
    }

    /// Places working directories under `parent` instead of the system temp dir
    pub fn with_workdir_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.workdir_parent = Some(parent.into());
        self
    }

    fn emit(&self, event: ProgressEvent) {
        self.progress.on_progress(&event);
    }

    fn begin(&self, phase: Phase) -> Instant {
        self.emit(ProgressEvent::PhaseStarted { phase });
        Instant::now()
    }

    fn end(&self, phase: Phase, started: Instant) {
        self.emit(ProgressEvent::PhaseComplete {
            phase,
            duration: started.elapsed(),
        });
    }

    async fn cleanup(&self, workdir: &mut WorkingDirectory) {
        let started = self.begin(Phase::Cleanup);
        let outcome = workdir.cleanup_async().await;
        self.emit(ProgressEvent::CleanupFinished {
            clean: outcome.is_clean(),
        });
        self.end(Phase::Cleanup, started);
    }

    fn fail<T>(&self, err: CoralizeError) -> Result<T, CoralizeError> {
        self.emit(ProgressEvent::Failed {
            error: err.to_string(),
        });
        Err(err)
    }

    /// Clones the repository and produces the wrapper and Dockerfile.
    ///
    /// On error the working directory has already been removed.
    pub async fn prepare(&self, request: &CoralizationRequest) -> Result<PreparedCoralization, CoralizeError> {
        self.emit(ProgressEvent::Started {
            repo_url: request.source.url.clone(),
        });

        let started = self.begin(Phase::Acquire);
        let mut acquirer = RepositoryAcquirer::new(self.vcs.clone(), self.settings.cleanup);
        if let Some(ref parent) = self.workdir_parent {
            acquirer = acquirer.with_parent_dir(parent);
        }
        let mut workdir = match acquirer.acquire(&request.source).await {
            Ok(dir) => dir,
            Err(e) => return self.fail(e.into()),
        };
        self.end(Phase::Acquire, started);

        match self.generate_in(workdir.path(), request).await {
            Ok((artifacts, candidates, context_files)) => Ok(PreparedCoralization {
                workdir,
                artifacts,
                candidates,
                context_files,
            }),
            Err(e) => {
                self.cleanup(&mut workdir).await;
                self.fail(e)
            }
        }
    }

    /// Runs [`prepare`](Self::prepare) unless `interrupt` resolves first.
    ///
    /// An abandoned preparation is dropped before this returns, and dropping it
    /// removes its working directory.
    async fn prepare_or_interrupt<F>(
        &self,
        request: &CoralizationRequest,
        interrupt: Pin<&mut F>,
    ) -> Result<Option<PreparedCoralization>, CoralizeError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            prepared = self.prepare(request) => prepared.map(Some),
            _ = interrupt => {
                info!("Interrupted before the artifacts were ready");
                Ok(None)
            }
        }
    }

    async fn generate_in(
        &self,
        root: &Path,
        request: &CoralizationRequest,
    ) -> Result<(GeneratedArtifacts, Vec<String>, Vec<String>), CoralizeError> {
        let started = self.begin(Phase::Scan);
        let tree = scan_structure(root, self.settings.max_tree_chars);
        self.emit(ProgressEvent::TreeScanned {
            chars: tree.len(),
            truncated: tree.ends_with(TRUNCATION_MARKER),
        });
        self.end(Phase::Scan, started);

        let started = self.begin(Phase::Select);
        let candidates = EntryPointSelector::new(self.client.as_ref()).select(&tree).await;
        self.emit(ProgressEvent::CandidatesSelected {
            candidates: candidates.clone(),
        });
        self.end(Phase::Select, started);

        let started = self.begin(Phase::Assemble);
        let blob = ContextAssembler::new(root, self.settings.max_code_context_chars).assemble(&candidates);
        self.emit(ProgressEvent::ContextAssembled {
            files: blob.entries().len(),
            chars: blob.len(),
        });
        let context_files: Vec<String> = blob.paths().into_iter().map(String::from).collect();
        self.end(Phase::Assemble, started);

        let started = self.begin(Phase::Generate);
        let code_context = blob.render();
        let prompt = PromptContext {
            coral_server_url: &request.coral_server_url,
            agent_id: &request.agent_id,
            file_tree: &tree,
            code_context: &code_context,
        };
        let wrapper = WrapperGenerator::new(self.client.as_ref()).generate(&prompt).await?;
        self.end(Phase::Generate, started);

        let started = self.begin(Phase::Synthesize);
        let dockerfile = synthesize_dockerfile(root, request.source.repo_name().as_deref());
        self.end(Phase::Synthesize, started);

        self.emit(ProgressEvent::ArtifactsReady {
            wrapper_chars: wrapper.len(),
            dockerfile_chars: dockerfile.len(),
        });

        Ok((GeneratedArtifacts::new(wrapper, dockerfile), candidates, context_files))
    }

    /// Runs the full pipeline, building and running the container.
    ///
    /// The request must carry the runtime credential. `interrupt` resolves
    /// when the operator asks to stop.
    pub async fn run<F>(&self, request: &CoralizationRequest, interrupt: F) -> Result<BuildRunOutcome, CoralizeError>
    where
        F: Future<Output = ()>,
    {
        let Some(credential) = request.credential.as_deref() else {
            return self.fail(CoralizeError::MissingCredential { var: API_KEY_ENV });
        };

        let total = Instant::now();
        tokio::pin!(interrupt);
        let Some(mut prepared) = self.prepare_or_interrupt(request, interrupt.as_mut()).await? else {
            self.emit(ProgressEvent::Completed {
                total_time: total.elapsed(),
            });
            return Ok(BuildRunOutcome::UserInterrupted);
        };

        let spec = RunSpec::new(request.image_name(), request.container_name())
            .env(API_KEY_ENV, credential)
            .env("CORAL_SERVER_URL", &request.coral_server_url)
            .env("CORAL_AGENT_ID", &request.agent_id)
            .network("host");

        let started = self.begin(Phase::BuildRun);
        let result = Orchestrator::new(self.engine.as_ref())
            .build_and_run(prepared.workdir.path(), &prepared.artifacts, &spec, interrupt)
            .await;
        self.end(Phase::BuildRun, started);

        self.cleanup(&mut prepared.workdir).await;

        match result {
            Ok(outcome) => {
                if let BuildRunOutcome::Success | BuildRunOutcome::UserInterrupted = outcome {
                    self.emit(ProgressEvent::Completed {
                        total_time: total.elapsed(),
                    });
                } else {
                    self.emit(ProgressEvent::Failed {
                        error: format!("{:?}", outcome),
                    });
                }
                Ok(outcome)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Generates the artifact pair into `output_dir` without building anything.
    ///
    /// Returns `None` when `interrupt` resolved before generation finished;
    /// nothing is written in that case.
    pub async fn generate_to<F>(
        &self,
        request: &CoralizationRequest,
        output_dir: &Path,
        interrupt: F,
    ) -> Result<Option<GeneratedArtifacts>, CoralizeError>
    where
        F: Future<Output = ()>,
    {
        let total = Instant::now();
        tokio::pin!(interrupt);
        let Some(mut prepared) = self.prepare_or_interrupt(request, interrupt.as_mut()).await? else {
            self.emit(ProgressEvent::Completed {
                total_time: total.elapsed(),
            });
            return Ok(None);
        };

        let written = fs::create_dir_all(output_dir)
            .map_err(|source| CoralizeError::ArtifactWrite {
                path: output_dir.to_path_buf(),
                source,
            })
            .and_then(|()| prepared.artifacts.write_to(output_dir));

        self.cleanup(&mut prepared.workdir).await;

        match written {
            Ok((wrapper, dockerfile)) => {
                info!(
                    "Wrote {} and {}",
                    wrapper.display(),
                    dockerfile.display()
                );
                debug!(context_files = ?prepared.context_files, "Context used for generation");
                self.emit(ProgressEvent::Completed {
                    total_time: total.elapsed(),
                });
                Ok(Some(prepared.artifacts))
            }
            Err(e) => self.fail(e),
        }
    }
}
