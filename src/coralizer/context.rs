//! Code context assembly
//!
//! Concatenates whole files into one budgeted blob for the generation prompt.
//! Files are taken in priority order (entry-point candidates, then dependency
//! manifests, then every other Python file) and are never split: the first
//! file that does not fit ends assembly.

use crate::config::PRIORITY_MANIFEST_FILES;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Header placed before each embedded file
pub fn file_header(relative_path: &str) -> String {
    format!("\n--- File: {} ---\n", relative_path)
}

/// One embedded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub path: String,
    pub content: String,
}

/// Ordered collection of embedded files, bounded by a character budget
#[derive(Debug, Clone, Default)]
pub struct ContextBlob {
    entries: Vec<ContextEntry>,
    len: usize,
}

impl ContextBlob {
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    /// Rendered length in bytes, headers included
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.len);
        for entry in &self.entries {
            out.push_str(&file_header(&entry.path));
            out.push_str(&entry.content);
        }
        out
    }
}

enum Admission {
    Added,
    /// Missing, unreadable or already embedded; assembly continues
    Skipped,
    /// Over budget; assembly stops
    Full,
}

/// Collects file contents from a working directory
pub struct ContextAssembler<'a> {
    root: &'a Path,
    canonical_root: Option<PathBuf>,
    budget: usize,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(root: &'a Path, budget: usize) -> Self {
        Self {
            root,
            canonical_root: root.canonicalize().ok(),
            budget,
        }
    }

    pub fn assemble(&self, candidates: &[String]) -> ContextBlob {
        let mut blob = ContextBlob::default();
        let mut seen = HashSet::new();

        let priority = candidates
            .iter()
            .map(String::as_str)
            .chain(PRIORITY_MANIFEST_FILES.iter().copied());

        for relative in priority {
            if let Admission::Full = self.admit(&mut blob, &mut seen, relative) {
                return self.finish(blob);
            }
        }

        for relative in self.python_files() {
            if let Admission::Full = self.admit(&mut blob, &mut seen, &relative) {
                warn!("Skipping remaining files due to context limit");
                break;
            }
        }

        self.finish(blob)
    }

    fn finish(&self, blob: ContextBlob) -> ContextBlob {
        if blob.is_empty() {
            warn!("No readable code files found or context limit too small; the agent will rely on the file tree");
        } else {
            info!(files = blob.entries.len(), chars = blob.len, "Assembled code context");
        }
        blob
    }

    fn admit(&self, blob: &mut ContextBlob, seen: &mut HashSet<String>, relative: &str) -> Admission {
        if seen.contains(relative) {
            return Admission::Skipped;
        }

        let path = self.root.join(relative);
        if !path.is_file() {
            warn!(file = %relative, "Context file not found, skipping");
            return Admission::Skipped;
        }
        if !self.is_inside_root(&path) {
            warn!(file = %relative, "Context file resolves outside the repository, skipping");
            return Admission::Skipped;
        }

        let content = match read_lossy(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %relative, "Could not read file: {}", e);
                return Admission::Skipped;
            }
        };

        let cost = file_header(relative).len() + content.len();
        if blob.len + cost > self.budget {
            warn!(
                file = %relative,
                size = cost,
                remaining = self.budget - blob.len,
                "Skipping content due to context limit"
            );
            return Admission::Full;
        }

        debug!(file = %relative, chars = cost, "Added file to context");
        seen.insert(relative.to_string());
        blob.len += cost;
        blob.entries.push(ContextEntry {
            path: relative.to_string(),
            content,
        });
        Admission::Added
    }

    fn is_inside_root(&self, path: &Path) -> bool {
        match (&self.canonical_root, path.canonicalize()) {
            (Some(root), Ok(resolved)) => resolved.starts_with(root),
            _ => false,
        }
    }

    /// Every `*.py` file under the root in sorted order, as relative paths
    fn python_files(&self) -> Vec<String> {
        WalkDir::new(self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git")
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "py").unwrap_or(false))
            .filter_map(|e| {
                e.path()
                    .strip_prefix(self.root)
                    .ok()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect()
    }
}

/// Reads a file, dropping byte sequences that are not valid UTF-8
fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).replace('\u{FFFD}', ""))
}
