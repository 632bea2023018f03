//! Progress handler trait and events

use std::fmt;
use std::time::Duration;

/// Stages of repository coralization, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Acquire,
    Scan,
    Select,
    Assemble,
    Generate,
    Synthesize,
    BuildRun,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Acquire => "acquire",
            Phase::Scan => "scan",
            Phase::Select => "select",
            Phase::Assemble => "assemble",
            Phase::Generate => "generate",
            Phase::Synthesize => "synthesize",
            Phase::BuildRun => "build_run",
            Phase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Events emitted while a coralization runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Started { repo_url: String },

    PhaseStarted { phase: Phase },

    PhaseComplete { phase: Phase, duration: Duration },

    /// Structure summary produced
    TreeScanned { chars: usize, truncated: bool },

    CandidatesSelected { candidates: Vec<String> },

    ContextAssembled { files: usize, chars: usize },

    ArtifactsReady {
        wrapper_chars: usize,
        dockerfile_chars: usize,
    },

    /// Working directory removal finished; `clean` is false when it was left behind
    CleanupFinished { clean: bool },

    Completed { total_time: Duration },

    Failed { error: String },
}

/// Trait for handling progress events during coralization
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::Started {
            repo_url: "https://github.com/org/repo".to_string(),
        });
        handler.on_progress(&ProgressEvent::PhaseStarted { phase: Phase::Acquire });
        handler.on_progress(&ProgressEvent::Completed {
            total_time: Duration::from_secs(5),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::BuildRun.to_string(), "build_run");
        assert_eq!(Phase::Acquire.to_string(), "acquire");
    }
}
