//! Turning agent code into runnable Coral agents
//!
//! Repository coralization clones a repository, asks the generation agent for
//! a wrapper script, synthesizes a Dockerfile and builds and runs the result.
//! MCP coralization renders a fixed wrapper around an existing MCP server.

pub mod acquire;
pub mod context;
pub mod dockerfile;
pub mod engine;
pub mod error;
pub mod generator;
pub mod mcp;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod request;
pub mod scanner;
pub mod selector;
pub mod workspace;

pub use acquire::{GitCli, RepositoryAcquirer, VersionControl};
pub use engine::{ContainerEngine, DockerCli, RunSpec};
pub use error::{AcquisitionError, CoralizeError, GenerationError};
pub use mcp::{McpCoralizer, ModelSettings};
pub use orchestrator::{BuildFailure, BuildRunOutcome, GeneratedArtifacts, Orchestrator};
pub use pipeline::{CoralizationPipeline, PipelineSettings, PreparedCoralization};
pub use request::{CoralizationRequest, SourceReference};
pub use workspace::{CleanupOutcome, CleanupPolicy, WorkingDirectory};
