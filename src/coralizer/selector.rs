//! Entry-point selection
//!
//! Asks the generation agent which files most likely start the agent and
//! parses its answer with an ordered chain of fallbacks. Selection never
//! fails: anything unusable degrades to [`DEFAULT_ENTRY_POINT_CANDIDATES`].

use crate::config::DEFAULT_ENTRY_POINT_CANDIDATES;
use crate::llm::LLMClient;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const SELECTOR_TEMPERATURE: f32 = 0.0;
const MAX_CANDIDATES: usize = 5;

const SELECTOR_SYSTEM_PROMPT: &str = "You are an expert Python developer reviewing an unfamiliar repository. \
Given its file structure, identify the files most likely to be the entry point of the agent or \
application it contains (the script that is run to start it). \
Respond ONLY with a JSON array of relative file paths, most likely first, for example \
[\"main.py\", \"src/agent/app.py\"]. Include at most 5 paths. Do not include any other text.";

/// Builds the user prompt that embeds the structure summary
pub fn selector_prompt(structure: &str) -> String {
    format!(
        "File structure of the repository (directories end with '/', the root is './'):\n\
         ```\n{}\n```\n\n\
         Which files are the most likely entry points?",
        structure
    )
}

/// Ranks entry-point candidates using the generation agent
pub struct EntryPointSelector<'a> {
    client: &'a dyn LLMClient,
}

impl<'a> EntryPointSelector<'a> {
    pub fn new(client: &'a dyn LLMClient) -> Self {
        Self { client }
    }

    /// Returns ordered relative paths; never empty
    pub async fn select(&self, structure: &str) -> Vec<String> {
        let response = match self
            .client
            .complete(SELECTOR_SYSTEM_PROMPT, &selector_prompt(structure), SELECTOR_TEMPERATURE)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("Entry-point ranking failed, using default candidates: {}", e);
                return default_candidates();
            }
        };

        let candidates = parse_candidates(&response);
        info!(candidates = ?candidates, "Selected entry-point candidates");
        candidates
    }
}

pub fn default_candidates() -> Vec<String> {
    DEFAULT_ENTRY_POINT_CANDIDATES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Parses a ranking response, falling back to the default set
pub fn parse_candidates(response: &str) -> Vec<String> {
    let parsed = parse_json_list(response)
        .or_else(|| parse_fenced_json_list(response))
        .or_else(|| parse_bracketed_list(response));

    let Some(raw) = parsed else {
        warn!("Could not parse entry-point candidates from the agent's response, using defaults");
        debug!(response = %response, "Unparsed selector response");
        return default_candidates();
    };

    let candidates = sanitize_candidates(raw);
    if candidates.is_empty() {
        warn!("No usable entry-point candidates in the agent's response, using defaults");
        return default_candidates();
    }
    candidates
}

fn parse_json_list(text: &str) -> Option<Vec<String>> {
    serde_json::from_str::<Vec<String>>(text.trim()).ok()
}

fn parse_fenced_json_list(text: &str) -> Option<Vec<String>> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let fence = FENCE
        .get_or_init(|| Regex::new(r"(?i)```(?:json)?\s*([\s\S]*?)\s*```").ok())
        .as_ref()?;

    fence
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_json_list(m.as_str()))
}

/// Lenient split of the first `[...]` span on commas, stripping quotes
fn parse_bracketed_list(text: &str) -> Option<Vec<String>> {
    let start = text.find('[')?;
    let end = start + text[start..].find(']')?;
    let items: Vec<String> = text[start + 1..end]
        .split([',', '\n'])
        .map(|item| item.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`').trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Drops entries that could escape the working directory, normalises `./`
/// prefixes, removes duplicates and caps the list length.
pub fn sanitize_candidates(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for entry in raw {
        match normalize_relative(&entry) {
            Some(path) => {
                if seen.insert(path.clone()) {
                    out.push(path);
                }
            }
            None => warn!(entry = %entry, "Dropping entry-point candidate outside the repository"),
        }
        if out.len() == MAX_CANDIDATES {
            break;
        }
    }
    out
}

/// Returns the path in `a/b/c` form if it stays inside the root
pub fn normalize_relative(entry: &str) -> Option<String> {
    let trimmed = entry.trim();
    if trimmed.is_empty() || trimmed.contains('\0') {
        return None;
    }

    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
