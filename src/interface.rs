//! Interface agent script generation
//!
//! The interface agent is the user-facing coordinator on a Coral chatroom. Its
//! script is a fixed template with the chatroom URL and agent id filled in.

use crate::templates::{python_literal, render, INTERFACE_AGENT};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_INTERFACE_AGENT_ID: &str = "user_interface_agent";

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("Failed to write interface agent to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write interface agent to stdout: {0}")]
    Stdout(#[source] io::Error),
}

/// Renders the interface agent script
pub fn render_interface_agent(coral_server_url: &str, agent_id: &str) -> String {
    let url = python_literal(coral_server_url);
    let id = python_literal(agent_id);
    render(
        INTERFACE_AGENT,
        &[("coral_server_url", url.as_str()), ("agent_id", id.as_str())],
    )
}

/// Writes the rendered script to `output`, or to stdout when `None`
pub fn write_interface_agent(script: &str, output: Option<&Path>) -> Result<(), InterfaceError> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| InterfaceError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(path, script).map_err(|source| InterfaceError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            info!(file = %path.display(), "Interface agent written");
            Ok(())
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(script.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(InterfaceError::Stdout)
        }
    }
}
