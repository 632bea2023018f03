//! Bounded directory structure summary

use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Appended as the final line when the summary is cut short
pub const TRUNCATION_MARKER: &str = "...";

const INDENT: &str = "    ";
const VCS_DIRS: [&str; 3] = [".git", ".hg", ".svn"];

/// Lists `root` as an indented tree, never exceeding `max_chars`.
///
/// Entries are sorted by name and version-control metadata is skipped. The
/// root itself is rendered as `./`, directories end with `/` and each level
/// adds four spaces of indentation. When the next line would not fit, the
/// listing is cut at the last line that leaves room for
/// [`TRUNCATION_MARKER`], which is then appended.
pub fn scan_structure(root: &Path, max_chars: usize) -> String {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_vcs_dir(e));

    let mut out = String::new();
    // Longest prefix that still leaves room for the marker
    let mut safe_len = 0;
    let mut files = 0usize;

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let line = if entry.depth() == 0 {
            "./\n".to_string()
        } else {
            let name = entry.file_name().to_string_lossy();
            let suffix = if entry.file_type().is_dir() { "/" } else { "" };
            format!("{}{}{}\n", INDENT.repeat(entry.depth()), name, suffix)
        };

        if out.len() + line.len() > max_chars {
            warn!("File tree truncated at {} characters", max_chars);
            out.truncate(safe_len);
            out.push_str(TRUNCATION_MARKER);
            return out;
        }

        out.push_str(&line);
        if !entry.file_type().is_dir() {
            files += 1;
        }
        if out.len() + TRUNCATION_MARKER.len() <= max_chars {
            safe_len = out.len();
        }
    }

    debug!(files, chars = out.len(), "Generated file tree");
    out
}

fn is_vcs_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| VCS_DIRS.contains(&name))
            .unwrap_or(false)
}
