//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { repo_url } => {
                info!(repo = %repo_url, "Starting coralization");
            }
            ProgressEvent::PhaseStarted { phase } => {
                debug!(phase = %phase, "Starting phase");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                debug!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::TreeScanned { chars, truncated } => {
                info!(chars, truncated, "Generated file tree");
            }
            ProgressEvent::CandidatesSelected { candidates } => {
                info!(candidates = ?candidates, "Entry-point candidates");
            }
            ProgressEvent::ContextAssembled { files, chars } => {
                info!(files, chars, "Read files for context");
            }
            ProgressEvent::ArtifactsReady {
                wrapper_chars,
                dockerfile_chars,
            } => {
                info!(wrapper_chars, dockerfile_chars, "Wrapper and Dockerfile generated");
            }
            ProgressEvent::CleanupFinished { clean } => {
                if *clean {
                    debug!("Working directory removed");
                } else {
                    warn!("Working directory could not be removed");
                }
            }
            ProgressEvent::Completed { total_time } => {
                info!(total_time_ms = total_time.as_millis(), "Coralization complete");
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Coralization failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Phase;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;

        let events = vec![
            ProgressEvent::Started {
                repo_url: "https://github.com/org/repo".to_string(),
            },
            ProgressEvent::PhaseStarted { phase: Phase::Scan },
            ProgressEvent::PhaseComplete {
                phase: Phase::Scan,
                duration: Duration::from_millis(5),
            },
            ProgressEvent::TreeScanned {
                chars: 120,
                truncated: false,
            },
            ProgressEvent::CandidatesSelected {
                candidates: vec!["main.py".to_string()],
            },
            ProgressEvent::ContextAssembled { files: 2, chars: 300 },
            ProgressEvent::ArtifactsReady {
                wrapper_chars: 900,
                dockerfile_chars: 400,
            },
            ProgressEvent::CleanupFinished { clean: true },
            ProgressEvent::CleanupFinished { clean: false },
            ProgressEvent::Completed {
                total_time: Duration::from_secs(3),
            },
            ProgressEvent::Failed {
                error: "Test error".to_string(),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
