//! Configuration management for coral
//!
//! Settings are loaded from environment variables with sensible defaults. All
//! budgets and fallback constants used by the coralization pipeline live here
//! rather than being scattered through the code.
//!
//! # Environment Variables
//!
//! - `CORAL_PROVIDER`: generation provider (openai|anthropic|ollama|gemini|groq|xai) - default: "openai"
//! - `CORAL_MODEL`: model name - default: "gpt-4o"
//! - `CORAL_REQUEST_TIMEOUT`: generation request timeout in seconds - default: unset (no timeout)
//! - `CORAL_API_BASE_URL`: custom endpoint for the generation provider - default: unset
//! - `CORAL_MAX_TREE_CHARS`: structure summary budget - default: "2000"
//! - `CORAL_MAX_CONTEXT_CHARS`: code context budget - default: "15000"
//! - `CORAL_CLEANUP_RETRIES`: working directory removal attempts - default: "3"
//! - `CORAL_CLEANUP_DELAY_MS`: delay between removal attempts - default: "1000"
//! - `CORAL_LOG_LEVEL`: logging level - default: "info"
//!
//! Provider credentials are read by the genai library itself (`OPENAI_API_KEY`,
//! `ANTHROPIC_API_KEY`, ...). `OPENAI_API_KEY` is also forwarded into the
//! built container as the runtime credential.

use crate::coralizer::workspace::CleanupPolicy;
use crate::llm::GenAIClient;
use genai::adapter::AdapterKind;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_TREE_CHARS: usize = 2000;
const DEFAULT_MAX_CODE_CONTEXT_CHARS: usize = 15000;
const DEFAULT_CLEANUP_ATTEMPTS: u32 = 3;
const DEFAULT_CLEANUP_DELAY_MS: u64 = 1000;

/// Default chatroom server address agents connect to
pub const DEFAULT_CORAL_SERVER_URL: &str = "http://localhost:3001/sse";

/// Entry-point guesses used whenever the generation agent gives no usable ranking
pub const DEFAULT_ENTRY_POINT_CANDIDATES: [&str; 4] = ["main.py", "app.py", "agent.py", "run.py"];

/// Dependency manifests always offered to the generation agent after the candidates
pub const PRIORITY_MANIFEST_FILES: [&str; 3] = ["requirements.txt", "pyproject.toml", "setup.py"];

/// File name of the generated wrapper, at the working directory root
pub const WRAPPER_FILE_NAME: &str = "coral_wrapper.py";

/// Base image for every generated Dockerfile
pub const BASE_IMAGE: &str = "python:3.10-slim";

/// Agent framework requirement installed into every repository image
pub const FRAMEWORK_REQUIREMENT: &str = "camel-ai[web-tools]>=0.2.0,<0.3.0";

/// Environment variable carrying the generation and runtime credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: openai, anthropic, ollama, gemini, groq, xai")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Main configuration structure for coral
#[derive(Debug, Clone)]
pub struct CoralConfig {
    /// Generation provider (from genai)
    pub provider: AdapterKind,

    /// Model name used for both entry-point ranking and wrapper generation
    pub model: String,

    /// Optional request timeout; `None` waits indefinitely
    pub request_timeout_secs: Option<u64>,

    /// Custom endpoint for the provider
    pub api_base_url: Option<String>,

    /// Structure summary budget (characters)
    pub max_tree_chars: usize,

    /// Context blob budget (characters)
    pub max_code_context_chars: usize,

    /// Number of removal attempts for the working directory
    pub cleanup_attempts: u32,

    /// Delay between removal attempts in milliseconds
    pub cleanup_delay_ms: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for CoralConfig {
    /// Loads configuration from `CORAL_*` environment variables, falling back
    /// to defaults for anything missing or unparsable.
    fn default() -> Self {
        let provider = env::var("CORAL_PROVIDER")
            .ok()
            .and_then(|s| parse_provider(&s).ok())
            .unwrap_or(AdapterKind::OpenAI);

        let model = env::var("CORAL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let request_timeout_secs = env::var("CORAL_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        let api_base_url = env::var("CORAL_API_BASE_URL").ok();

        let max_tree_chars = env::var("CORAL_MAX_TREE_CHARS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_TREE_CHARS);

        let max_code_context_chars = env::var("CORAL_MAX_CONTEXT_CHARS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_CODE_CONTEXT_CHARS);

        let cleanup_attempts = env::var("CORAL_CLEANUP_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_CLEANUP_ATTEMPTS);

        let cleanup_delay_ms = env::var("CORAL_CLEANUP_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CLEANUP_DELAY_MS);

        let log_level = env::var("CORAL_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            provider,
            model,
            request_timeout_secs,
            api_base_url,
            max_tree_chars,
            max_code_context_chars,
            cleanup_attempts,
            cleanup_delay_ms,
            log_level,
        }
    }
}

/// Parses a provider name as accepted on the command line and in `CORAL_PROVIDER`
pub fn parse_provider(s: &str) -> Result<AdapterKind, ConfigError> {
    let lowered = s.to_lowercase();
    let normalized = match lowered.as_str() {
        "claude" => "anthropic",
        "grok" => "xai",
        other => other,
    };
    AdapterKind::from_lower_str(normalized).ok_or_else(|| ConfigError::InvalidProvider(s.to_string()))
}

impl CoralConfig {
    /// Validates the configuration
    ///
    /// Budgets must be large enough to hold at least a truncation marker or a
    /// file header, the retry policy must be bounded, and the log level must be
    /// one tracing understands.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name cannot be empty".to_string(),
            ));
        }

        if let Some(0) = self.request_timeout_secs {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }

        if self.max_tree_chars < 64 {
            return Err(ConfigError::ValidationFailed(
                "Max tree chars must be at least 64".to_string(),
            ));
        }

        if self.max_code_context_chars < 256 {
            return Err(ConfigError::ValidationFailed(
                "Max code context chars must be at least 256".to_string(),
            ));
        }

        if self.cleanup_attempts == 0 || self.cleanup_attempts > 10 {
            return Err(ConfigError::ValidationFailed(
                "Cleanup retries must be between 1 and 10".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn cleanup_policy(&self) -> CleanupPolicy {
        CleanupPolicy {
            attempts: self.cleanup_attempts,
            delay: Duration::from_millis(self.cleanup_delay_ms),
        }
    }

    /// Creates the generation client for the configured provider
    pub fn create_client(&self) -> GenAIClient {
        GenAIClient::new(
            self.provider,
            self.model.clone(),
            self.request_timeout(),
            self.api_base_url.clone(),
        )
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("provider".to_string(), self.provider.as_str().to_string());
        map.insert("model".to_string(), self.model.clone());
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".to_string()),
        );
        if let Some(ref url) = self.api_base_url {
            map.insert("api_base_url".to_string(), url.clone());
        }
        map.insert("max_tree_chars".to_string(), self.max_tree_chars.to_string());
        map.insert(
            "max_code_context_chars".to_string(),
            self.max_code_context_chars.to_string(),
        );
        map.insert(
            "cleanup_attempts".to_string(),
            self.cleanup_attempts.to_string(),
        );
        map.insert(
            "cleanup_delay_ms".to_string(),
            self.cleanup_delay_ms.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for CoralConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Coral Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider.as_str())?;
        writeln!(f, "  Model: {}", self.model)?;
        match self.request_timeout_secs {
            Some(secs) => writeln!(f, "  Request Timeout: {}s", secs)?,
            None => writeln!(f, "  Request Timeout: none")?,
        }
        if let Some(ref url) = self.api_base_url {
            writeln!(f, "  API Base URL: {}", url)?;
        }
        writeln!(f, "  Max Tree Chars: {}", self.max_tree_chars)?;
        writeln!(f, "  Max Code Context Chars: {}", self.max_code_context_chars)?;
        writeln!(
            f,
            "  Cleanup: {} attempts, {}ms apart",
            self.cleanup_attempts, self.cleanup_delay_ms
        )?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
