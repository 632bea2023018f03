//! coral - command line tooling for the Coral multi-agent protocol
//!
//! The centrepiece is *coralization*: taking an existing agent repository,
//! asking a generation agent for a wrapper that connects it to a Coral
//! chatroom, and building and running the result in a container.
//!
//! # Core Concepts
//!
//! - **Generation agent**: an LLM reached through [`llm::LLMClient`] that ranks
//!   entry points and writes the wrapper script
//! - **Coralization pipeline**: acquire → scan → select → assemble → generate →
//!   synthesize → build/run, see [`coralizer::CoralizationPipeline`]
//! - **Container engine**: build/run/stop behind [`coralizer::ContainerEngine`]
//!
//! # Example Usage
//!
//! ```ignore
//! use coral_cli::coralizer::{
//!     CoralizationPipeline, CoralizationRequest, DockerCli, GitCli, PipelineSettings, SourceReference,
//! };
//! use coral_cli::CoralConfig;
//! use std::sync::Arc;
//!
//! async fn coralize(url: &str) -> Result<i32, Box<dyn std::error::Error>> {
//!     let config = CoralConfig::default();
//!     let pipeline = CoralizationPipeline::new(
//!         Arc::new(config.create_client()),
//!         Arc::new(GitCli::default()),
//!         Arc::new(DockerCli::default()),
//!         PipelineSettings::from(&config),
//!     );
//!
//!     let request = CoralizationRequest::new(SourceReference::new(url), "my_agent")
//!         .with_credential(std::env::var("OPENAI_API_KEY")?);
//!     let interrupt = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!     let outcome = pipeline.run(&request, interrupt).await?;
//!     Ok(outcome.exit_code())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod coralizer;
pub mod interface;
pub mod llm;
pub mod process;
pub mod progress;
pub mod server;
pub mod templates;
pub mod util;

pub use config::{CoralConfig, ConfigError};
pub use coralizer::{BuildRunOutcome, CoralizationPipeline, CoralizationRequest, CoralizeError, SourceReference};
pub use llm::{BackendError, GenAIClient, LLMClient, MockLLMClient};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
