//! Template-based wrapper for an already running MCP server
//!
//! No generation agent is involved: the wrapper script and Dockerfile are
//! rendered from fixed templates, then built and run in a fresh working
//! directory through the same [`Orchestrator`] as repository coralization.

use super::engine::{ContainerEngine, RunSpec};
use super::error::CoralizeError;
use super::orchestrator::{BuildRunOutcome, GeneratedArtifacts, Orchestrator};
use super::request::{agent_slug, container_name};
use super::workspace::{CleanupPolicy, WorkingDirectory};
use crate::config::{API_KEY_ENV, BASE_IMAGE, DEFAULT_CORAL_SERVER_URL, WRAPPER_FILE_NAME};
use crate::templates::{python_literal, render, MCP_WRAPPER};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use tracing::info;

const MCP_WORKDIR_PREFIX: &str = "coral_mcp_";
// Quoted so the shell form of RUN does not read `>=` as a redirection.
const MCP_REQUIREMENTS: &str = "'camel-ai>=0.2.0' 'pydantic>=2.0'";

pub const DEFAULT_MCP_SYSTEM_MESSAGE: &str =
    "You are a helpful agent that exposes the tools of an MCP server to the other agents on the Coral network.";

/// Sampling settings embedded into the wrapper
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 4096,
        }
    }
}

/// Inputs for wrapping an MCP server
#[derive(Debug, Clone)]
pub struct McpCoralizer {
    pub coral_server_url: String,
    pub target_mcp_url: String,
    pub agent_id: String,
    pub system_message: String,
    pub model: ModelSettings,
    /// Parent of the working directory; the system temp dir when unset
    pub workdir_parent: Option<PathBuf>,
}

impl McpCoralizer {
    pub fn new(target_mcp_url: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            coral_server_url: DEFAULT_CORAL_SERVER_URL.to_string(),
            target_mcp_url: target_mcp_url.into(),
            agent_id: agent_id.into(),
            system_message: DEFAULT_MCP_SYSTEM_MESSAGE.to_string(),
            model: ModelSettings::default(),
            workdir_parent: None,
        }
    }

    pub fn with_workdir_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.workdir_parent = Some(parent.into());
        self
    }

    pub fn image_name(&self) -> String {
        format!("mcp-coralizer-{}", agent_slug(&self.agent_id))
    }

    pub fn container_name(&self) -> String {
        container_name(&self.agent_id)
    }

    pub fn generate_wrapper(&self) -> String {
        let model_config = serde_json::to_string(&self.model).unwrap_or_else(|_| "{}".to_string());
        let coral_url = python_literal(&self.coral_server_url);
        let target_url = python_literal(&self.target_mcp_url);
        let agent_id = python_literal(&self.agent_id);
        let system_message = python_literal(&self.system_message);

        render(
            MCP_WRAPPER,
            &[
                ("coral_server_url", coral_url.as_str()),
                ("target_mcp_url", target_url.as_str()),
                ("agent_id", agent_id.as_str()),
                ("system_message", system_message.as_str()),
                ("model_config", model_config.as_str()),
            ],
        )
    }

    pub fn generate_dockerfile(&self) -> String {
        format!(
            "FROM {base}

WORKDIR /app

COPY {wrapper} /app/

RUN pip install --no-cache-dir {requirements}

# OPENAI_API_KEY is passed with 'docker run -e'

CMD [\"python\", \"-u\", \"/app/{wrapper}\"]
",
            base = BASE_IMAGE,
            wrapper = WRAPPER_FILE_NAME,
            requirements = MCP_REQUIREMENTS,
        )
    }

    pub fn artifacts(&self) -> GeneratedArtifacts {
        GeneratedArtifacts::new(self.generate_wrapper(), self.generate_dockerfile())
    }

    pub fn run_spec(&self, api_key: &str) -> RunSpec {
        RunSpec::new(self.image_name(), self.container_name())
            .env(API_KEY_ENV, api_key)
            .network("host")
    }

    /// Builds and runs the wrapper in a fresh working directory
    pub async fn build_and_run<F>(
        &self,
        engine: &dyn ContainerEngine,
        api_key: &str,
        policy: CleanupPolicy,
        interrupt: F,
    ) -> Result<BuildRunOutcome, CoralizeError>
    where
        F: Future<Output = ()>,
    {
        let mut workdir = match self.workdir_parent {
            Some(ref parent) => WorkingDirectory::create_in(parent, MCP_WORKDIR_PREFIX, policy),
            None => WorkingDirectory::create(MCP_WORKDIR_PREFIX, policy),
        }
        .map_err(CoralizeError::Workspace)?;
        info!(
            agent = %self.agent_id,
            mcp = %self.target_mcp_url,
            "Coralizing MCP server in {}",
            workdir.path().display()
        );

        let result = Orchestrator::new(engine)
            .build_and_run(workdir.path(), &self.artifacts(), &self.run_spec(api_key), interrupt)
            .await;
        workdir.cleanup_async().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coralizer() -> McpCoralizer {
        let mut c = McpCoralizer::new("http://localhost:8000/sse", "Weather Agent");
        c.system_message = "You answer weather questions.\nUse '''tools''' wisely.".to_string();
        c
    }

    #[test]
    fn test_names() {
        let c = coralizer();
        assert_eq!(c.image_name(), "mcp-coralizer-weather-agent");
        assert_eq!(c.container_name(), "coral-agent-weather-agent");
    }

    #[test]
    fn test_wrapper_embeds_settings() {
        let wrapper = coralizer().generate_wrapper();

        assert!(wrapper.contains(r#"CORAL_SERVER_URL = "http://localhost:3001/sse""#));
        assert!(wrapper.contains(r#"TARGET_MCP_URL = "http://localhost:8000/sse""#));
        assert!(wrapper.contains(r#"AGENT_ID = "Weather Agent""#));
        assert!(wrapper.contains(r#"SYSTEM_MESSAGE = "You answer weather questions.\nUse '''tools''' wisely.""#));
        assert!(wrapper.contains(r#"MODEL_CONFIG = {"temperature":0.3,"max_tokens":4096}"#));
        assert!(!wrapper.contains("{{"));
    }

    #[test]
    fn test_system_message_placeholder_text_kept_literal() {
        let mut c = coralizer();
        c.system_message = "Mention {{model_config}} verbatim".to_string();

        let wrapper = c.generate_wrapper();

        assert!(wrapper.contains(r#"SYSTEM_MESSAGE = "Mention {{model_config}} verbatim""#));
        assert!(wrapper.contains(r#"MODEL_CONFIG = {"temperature":0.3,"max_tokens":4096}"#));
    }

    #[test]
    fn test_wrapper_is_deterministic() {
        assert_eq!(coralizer().generate_wrapper(), coralizer().generate_wrapper());
    }

    #[test]
    fn test_dockerfile() {
        let dockerfile = coralizer().generate_dockerfile();
        assert!(dockerfile.starts_with("FROM python:3.10-slim\n"));
        assert!(dockerfile.contains("COPY coral_wrapper.py /app/"));
        assert!(dockerfile.contains("RUN pip install --no-cache-dir 'camel-ai>=0.2.0' 'pydantic>=2.0'\n"));
        let install = dockerfile.lines().find(|l| l.starts_with("RUN pip install")).unwrap();
        assert!(!install.contains(" camel-ai>="));
        assert!(!install.contains(" pydantic>="));
        assert!(!dockerfile.contains("COPY . /app/"));
    }

    #[test]
    fn test_only_api_key_injected() {
        let spec = coralizer().run_spec("sk-test");
        assert_eq!(spec.env, vec![(API_KEY_ENV.to_string(), "sk-test".to_string())]);
        assert_eq!(spec.network.as_deref(), Some("host"));
    }
}
