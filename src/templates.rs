//! Embedded script templates
//!
//! Project scaffolds for `coral init` and the fixed Python scripts rendered by
//! the MCP coralizer, the interface agent and the generation prompt. Templates
//! are compiled into the binary; placeholders have the form `{{name}}`.

use std::fs;
use std::io;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

pub const MCP_WRAPPER: &str = include_str!("../templates/wrappers/mcp_wrapper.py");
pub const WRAPPER_EXAMPLE: &str = include_str!("../templates/wrappers/wrapper_example.py");
pub const INTERFACE_AGENT: &str = include_str!("../templates/interface_agent.py");

/// A file within a project scaffold
#[derive(Debug, Clone, Copy)]
pub struct TemplateFile {
    pub path: &'static str,
    pub contents: &'static str,
}

/// A scaffold selected by framework and language
#[derive(Debug, Clone, Copy)]
pub struct ProjectTemplate {
    pub framework: &'static str,
    pub language: &'static str,
    pub files: &'static [TemplateFile],
}

impl ProjectTemplate {
    pub fn key(&self) -> String {
        format!("{}-{}", self.framework, self.language)
    }
}

const LANGGRAPH_PYTHON: &[TemplateFile] = &[
    TemplateFile {
        path: "agent.py",
        contents: include_str!("../templates/python/langgraph/agent.py"),
    },
    TemplateFile {
        path: "prompts.py",
        contents: include_str!("../templates/python/langgraph/prompts.py"),
    },
];

pub const PROJECT_TEMPLATES: &[ProjectTemplate] = &[ProjectTemplate {
    framework: "langgraph",
    language: "python",
    files: LANGGRAPH_PYTHON,
}];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found for {framework}-{language}. Available templates: {available}")]
    NotFound {
        framework: String,
        language: String,
        available: String,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Comma-separated `framework-language` keys
pub fn available_templates() -> String {
    PROJECT_TEMPLATES
        .iter()
        .map(ProjectTemplate::key)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn find_template(framework: &str, language: &str) -> Result<&'static ProjectTemplate, TemplateError> {
    let framework = framework.trim().to_lowercase();
    let language = language.trim().to_lowercase();

    PROJECT_TEMPLATES
        .iter()
        .find(|t| t.framework == framework && t.language == language)
        .ok_or_else(|| TemplateError::NotFound {
            framework,
            language,
            available: available_templates(),
        })
}

/// Writes every file of `template` under `output_dir`, returning the created paths
pub fn generate_project(template: &ProjectTemplate, output_dir: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let mut created = Vec::with_capacity(template.files.len());

    for file in template.files {
        let target = output_dir.join(file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| TemplateError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&target, file.contents).map_err(|source| TemplateError::Write {
            path: target.clone(),
            source,
        })?;
        info!(file = %target.display(), "Created template file");
        created.push(target);
    }

    Ok(created)
}

fn placeholder() -> Option<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").ok())
        .as_ref()
}

/// Substitutes `{{key}}` placeholders in one pass; unknown placeholders are
/// left as-is and substituted values are never scanned again.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let Some(pattern) = placeholder() else {
        return template.to_string();
    };
    pattern
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Quotes `value` as a Python string literal.
///
/// JSON string escapes are a subset of Python's, so the JSON encoding is used.
///
/// ```
/// use coral_cli::templates::python_literal;
///
/// assert_eq!(python_literal("say \"hi\"\n"), r#""say \"hi\"\n""#);
/// ```
pub fn python_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
