//! Coralization request and naming helpers

use crate::config::DEFAULT_CORAL_SERVER_URL;

/// Remote repository location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    pub url: String,
    pub branch: Option<String>,
}

impl SourceReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Last path segment of the URL without a `.git` suffix
    ///
    /// ```
    /// use coral_cli::coralizer::SourceReference;
    ///
    /// let source = SourceReference::new("https://github.com/org/my_agent.git");
    /// assert_eq!(source.repo_name().as_deref(), Some("my_agent"));
    /// ```
    pub fn repo_name(&self) -> Option<String> {
        let trimmed = self.url.trim_end_matches('/');
        let last = trimmed.rsplit(['/', ':']).next()?;
        let name = last.strip_suffix(".git").unwrap_or(last);
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

/// Everything a single coralization run needs; not modified once the pipeline starts
#[derive(Debug, Clone)]
pub struct CoralizationRequest {
    pub source: SourceReference,
    pub coral_server_url: String,
    pub agent_id: String,
    /// Runtime credential injected into the container
    pub credential: Option<String>,
}

impl CoralizationRequest {
    pub fn new(source: SourceReference, agent_id: impl Into<String>) -> Self {
        Self {
            source,
            coral_server_url: DEFAULT_CORAL_SERVER_URL.to_string(),
            agent_id: agent_id.into(),
            credential: None,
        }
    }

    pub fn with_coral_server_url(mut self, url: impl Into<String>) -> Self {
        self.coral_server_url = url.into();
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn agent_slug(&self) -> String {
        agent_slug(&self.agent_id)
    }

    pub fn image_name(&self) -> String {
        format!("github-coralizer-{}", self.agent_slug())
    }

    pub fn container_name(&self) -> String {
        container_name(&self.agent_id)
    }
}

/// Image and container-safe form of an agent id
///
/// Lowercases, turns whitespace into `-` and replaces anything outside
/// `[a-z0-9_.-]` with `-`.
pub fn agent_slug(agent_id: &str) -> String {
    agent_id
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '.' | '-' => c,
            _ => '-',
        })
        .collect()
}

/// Name of the container running an agent
pub fn container_name(agent_id: &str) -> String {
    format!("coral-agent-{}", agent_slug(agent_id))
}
