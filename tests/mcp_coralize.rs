//! MCP wrapping through the recording engine
//!
//! Builds and runs the template wrapper in a scratch parent directory and
//! checks that the working directory is gone afterwards.

mod support;

use coral_cli::coralizer::{BuildRunOutcome, CleanupPolicy, McpCoralizer};
use std::time::Duration;
use support::{leftover_entries, RecordingEngine};
use tempfile::TempDir;

fn coralizer(parent: &std::path::Path) -> McpCoralizer {
    McpCoralizer::new("http://localhost:8000/sse", "Weather Agent").with_workdir_parent(parent)
}

#[tokio::test]
async fn test_build_and_run_cleans_up() {
    let scratch = TempDir::new().unwrap();
    let engine = RecordingEngine::default();

    let outcome = coralizer(scratch.path())
        .build_and_run(&engine, "sk-test", CleanupPolicy::default(), std::future::pending())
        .await
        .unwrap();

    assert!(matches!(outcome, BuildRunOutcome::Success));
    assert_eq!(
        engine.calls(),
        vec!["build mcp-coralizer-weather-agent", "run coral-agent-weather-agent"]
    );
    let dockerfile = &engine.dockerfiles.lock().unwrap()[0];
    assert!(dockerfile.contains("RUN pip install --no-cache-dir 'camel-ai>=0.2.0' 'pydantic>=2.0'"));
    assert!(engine.wrappers.lock().unwrap()[0].contains(r#"TARGET_MCP_URL = "http://localhost:8000/sse""#));
    assert_eq!(leftover_entries(scratch.path()), 0);
}

#[tokio::test]
async fn test_failed_build_cleans_up() {
    let scratch = TempDir::new().unwrap();
    let engine = RecordingEngine::failing_build("failed to solve: pip install exited with 1");

    let outcome = coralizer(scratch.path())
        .build_and_run(&engine, "sk-test", CleanupPolicy::default(), std::future::pending())
        .await
        .unwrap();

    assert!(matches!(outcome, BuildRunOutcome::BuildFailure(_)));
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(leftover_entries(scratch.path()), 0);
}

#[tokio::test]
async fn test_interrupted_run_stops_container() {
    let scratch = TempDir::new().unwrap();
    let engine = RecordingEngine::hanging_run();

    let outcome = coralizer(scratch.path())
        .build_and_run(
            &engine,
            "sk-test",
            CleanupPolicy::default(),
            tokio::time::sleep(Duration::from_millis(200)),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, BuildRunOutcome::UserInterrupted));
    assert_eq!(outcome.exit_code(), 130);
    assert_eq!(engine.calls().last().map(String::as_str), Some("stop coral-agent-weather-agent"));
    let spec = &engine.run_specs.lock().unwrap()[0];
    assert_eq!(spec.env, vec![("OPENAI_API_KEY".to_string(), "sk-test".to_string())]);
    assert_eq!(leftover_entries(scratch.path()), 0);
}
