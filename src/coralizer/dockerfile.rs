//! Dockerfile synthesis from dependency manifests
//!
//! Fixed rules only: each detected manifest contributes its install steps in
//! manifest order, and the agent framework is always installed last.

use crate::config::{BASE_IMAGE, FRAMEWORK_REQUIREMENT, WRAPPER_FILE_NAME};
use std::path::Path;
use tracing::{debug, warn};

/// Placeholder emitted when no manifest is found
pub const NO_MANIFEST_PLACEHOLDER: &str = "# Add necessary pip installs here if needed";

/// Python dependency manifests recognised at the repository root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyManifest {
    Requirements,
    SetupPy,
    Pyproject,
}

impl DependencyManifest {
    pub const ALL: [DependencyManifest; 3] = [
        DependencyManifest::Requirements,
        DependencyManifest::SetupPy,
        DependencyManifest::Pyproject,
    ];

    pub fn filename(&self) -> &'static str {
        match self {
            DependencyManifest::Requirements => "requirements.txt",
            DependencyManifest::SetupPy => "setup.py",
            DependencyManifest::Pyproject => "pyproject.toml",
        }
    }

    /// Install steps for this manifest. `package_hint` names the directory a
    /// `setup.py` project most likely keeps its package in.
    pub fn install_steps(&self, root: &Path, package_hint: Option<&str>) -> Vec<String> {
        match self {
            DependencyManifest::Requirements => vec![
                "COPY requirements.txt .".to_string(),
                "RUN pip install --no-cache-dir -r requirements.txt".to_string(),
            ],
            DependencyManifest::SetupPy => {
                let mut steps = vec!["COPY setup.py .".to_string()];
                for extra in ["setup.cfg", "MANIFEST.in"] {
                    if root.join(extra).is_file() {
                        steps.push(format!("COPY {} .", extra));
                    }
                }
                match package_hint.filter(|name| root.join(name).is_dir()) {
                    Some(name) => steps.push(format!("COPY {} ./{}", name, name)),
                    None if root.join("src").is_dir() => steps.push("COPY src ./src".to_string()),
                    None => {}
                }
                steps.push("RUN pip install --no-cache-dir .".to_string());
                steps
            }
            DependencyManifest::Pyproject => {
                let mut steps = vec!["COPY pyproject.toml .".to_string()];
                if root.join("poetry.lock").is_file() {
                    steps.push("COPY poetry.lock .".to_string());
                }
                steps.push("RUN pip install --no-cache-dir poetry".to_string());
                steps.push(
                    "RUN poetry config virtualenvs.create false && poetry install --no-dev --no-interaction --no-ansi"
                        .to_string(),
                );
                steps
            }
        }
    }
}

/// Manifests present at `root`, in rule order
pub fn detect_manifests(root: &Path) -> Vec<DependencyManifest> {
    DependencyManifest::ALL
        .into_iter()
        .filter(|m| root.join(m.filename()).is_file())
        .collect()
}

/// Dependency install section of the Dockerfile
pub fn install_section(root: &Path, package_hint: Option<&str>) -> String {
    let manifests = detect_manifests(root);
    let mut lines = Vec::new();

    if manifests.is_empty() {
        warn!(
            "No standard dependency file found (requirements.txt, setup.py, pyproject.toml); only installing the agent framework"
        );
        lines.push(NO_MANIFEST_PLACEHOLDER.to_string());
    }
    for manifest in &manifests {
        debug!(manifest = manifest.filename(), "Adding install steps");
        lines.extend(manifest.install_steps(root, package_hint));
    }

    lines.push(format!("RUN pip install --no-cache-dir '{}'", FRAMEWORK_REQUIREMENT));
    lines.join("\n")
}

/// Renders the Dockerfile for a cloned repository at `root`
pub fn synthesize_dockerfile(root: &Path, package_hint: Option<&str>) -> String {
    format!(
        "FROM {base}

WORKDIR /app

# Copy the repository so later COPY/RUN steps work relative to /app
COPY . /app/

# Generated Coral wrapper
COPY {wrapper} /app/

# Dependencies
{install}

# Runtime configuration is passed with 'docker run -e'
# ENV OPENAI_API_KEY=...
# ENV CORAL_SERVER_URL=...
# ENV CORAL_AGENT_ID=...

CMD [\"python\", \"-u\", \"/app/{wrapper}\"]
",
        base = BASE_IMAGE,
        wrapper = WRAPPER_FILE_NAME,
        install = install_section(root, package_hint),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo(files: &[&str], dirs: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for f in files {
            fs::write(dir.path().join(f), "").unwrap();
        }
        for d in dirs {
            fs::create_dir_all(dir.path().join(d)).unwrap();
        }
        dir
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("missing {:?} in\n{}", needle, haystack))
    }

    #[test]
    fn test_requirements_and_pyproject_in_order() {
        let dir = repo(&["requirements.txt", "pyproject.toml"], &[]);
        let dockerfile = synthesize_dockerfile(dir.path(), None);

        let req = position(&dockerfile, "RUN pip install --no-cache-dir -r requirements.txt");
        let poetry = position(&dockerfile, "poetry install --no-dev");
        let framework = position(&dockerfile, FRAMEWORK_REQUIREMENT);
        assert!(req < poetry && poetry < framework);
        assert!(!dockerfile.contains("COPY poetry.lock"));
    }

    #[test]
    fn test_no_manifest_emits_placeholder() {
        let dir = repo(&["main.py"], &[]);
        let install = install_section(dir.path(), None);

        assert_eq!(
            install,
            format!(
                "{}\nRUN pip install --no-cache-dir '{}'",
                NO_MANIFEST_PLACEHOLDER, FRAMEWORK_REQUIREMENT
            )
        );
    }

    #[test]
    fn test_setup_py_copies_package_and_extras() {
        let dir = repo(&["setup.py", "setup.cfg", "MANIFEST.in"], &["my_agent", "src"]);
        let steps = DependencyManifest::SetupPy.install_steps(dir.path(), Some("my_agent"));

        assert_eq!(
            steps,
            vec![
                "COPY setup.py .",
                "COPY setup.cfg .",
                "COPY MANIFEST.in .",
                "COPY my_agent ./my_agent",
                "RUN pip install --no-cache-dir .",
            ]
        );
    }

    #[test]
    fn test_setup_py_falls_back_to_src() {
        let dir = repo(&["setup.py"], &["src"]);
        let steps = DependencyManifest::SetupPy.install_steps(dir.path(), Some("missing"));
        assert!(steps.contains(&"COPY src ./src".to_string()));
    }

    #[test]
    fn test_poetry_lock_copied_when_present() {
        let dir = repo(&["pyproject.toml", "poetry.lock"], &[]);
        let steps = DependencyManifest::Pyproject.install_steps(dir.path(), None);
        assert_eq!(steps[1], "COPY poetry.lock .");
    }

    #[test]
    fn test_dockerfile_shape() {
        let dir = repo(&["requirements.txt"], &[]);
        let dockerfile = synthesize_dockerfile(dir.path(), None);

        assert!(dockerfile.starts_with("FROM python:3.10-slim\n"));
        assert!(dockerfile.contains("WORKDIR /app"));
        assert!(dockerfile.contains("COPY coral_wrapper.py /app/"));
        assert!(dockerfile.trim_end().ends_with(r#"CMD ["python", "-u", "/app/coral_wrapper.py"]"#));
    }

    #[test]
    fn test_framework_always_last_install_step() {
        for files in [&["requirements.txt"][..], &["setup.py"], &["pyproject.toml"], &[]] {
            let dir = repo(files, &[]);
            let install = install_section(dir.path(), None);
            assert!(install.ends_with(&format!("'{}'", FRAMEWORK_REQUIREMENT)));
        }
    }
}
