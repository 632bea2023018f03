//! Wrapper script generation
//!
//! One request to the generation agent, then a three-tier extraction:
//! a fenced `python` block, a raw response that is recognisably wrapper code,
//! or an [`GenerationError::Unparsable`] failure carrying the full response.

use super::error::GenerationError;
use super::prompt::{generation_system_prompt, PromptContext, GENERATION_TEMPERATURE, GENERATION_USER_PROMPT};
use crate::llm::LLMClient;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info, warn};

/// Substrings that identify a raw response as wrapper code
pub const STRUCTURAL_MARKERS: [&str; 6] = [
    "import asyncio",
    "MCPToolkit",
    "MCPClient",
    "ChatAgent",
    "async def main",
    "asyncio.run(",
];

const MIN_MARKERS: usize = 2;

fn python_fence() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?i)```(?:python3?|py)\b[^\S\n]*\n?([\s\S]+?)\s*```").ok())
        .as_ref()
}

fn extract_fenced(response: &str) -> Option<String> {
    let caps = python_fence()?.captures(response)?;
    let code = caps.get(1)?.as_str().trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

fn extract_raw(response: &str) -> Option<String> {
    let markers = STRUCTURAL_MARKERS
        .iter()
        .filter(|m| response.contains(**m))
        .count();

    if markers >= MIN_MARKERS {
        warn!("Could not find ```python block, using raw response as code");
        Some(response.trim().to_string())
    } else {
        None
    }
}

/// Pulls the wrapper source out of an agent response
pub fn extract_code(response: &str) -> Result<String, GenerationError> {
    extract_fenced(response)
        .or_else(|| extract_raw(response))
        .ok_or_else(|| GenerationError::Unparsable {
            raw_response: response.to_string(),
        })
}

/// Generates `coral_wrapper.py` source with the generation agent
pub struct WrapperGenerator<'a> {
    client: &'a dyn LLMClient,
}

impl<'a> WrapperGenerator<'a> {
    pub fn new(client: &'a dyn LLMClient) -> Self {
        Self { client }
    }

    pub async fn generate(&self, ctx: &PromptContext<'_>) -> Result<String, GenerationError> {
        let system_prompt = generation_system_prompt(ctx);

        info!(
            client = self.client.name(),
            prompt_chars = system_prompt.len(),
            "Asking generation agent to write wrapper code"
        );
        let started = Instant::now();
        let response = self
            .client
            .complete(&system_prompt, GENERATION_USER_PROMPT, GENERATION_TEMPERATURE)
            .await?;
        info!(
            response_chars = response.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Agent generation complete"
        );

        extract_code(&response)
    }
}
