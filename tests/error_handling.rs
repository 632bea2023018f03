//! Error handling integration tests
//!
//! Covers the failure taxonomy users actually see: clone failures, missing
//! credentials, configuration validation and the remediation text printed for
//! each.

mod support;

use coral_cli::config::{CoralConfig, ConfigError, API_KEY_ENV};
use coral_cli::coralizer::{
    AcquisitionError, CoralizationPipeline, CoralizationRequest, CoralizeError, PipelineSettings,
    RepositoryAcquirer, SourceReference,
};
use coral_cli::coralizer::workspace::{remove_dir_with_retry, CleanupOutcome, CleanupPolicy};
use coral_cli::llm::{BackendError, MockLLMClient, MockResponse};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use support::{leftover_entries, FixtureGit, RecordingEngine, RejectingGit};
use tempfile::TempDir;
use yare::parameterized;

#[parameterized(
    auth = {
        "fatal: could not read Username for 'https://github.com': terminal prompts disabled",
        "Authentication"
    },
    network = {
        "fatal: unable to access 'https://github.com/org/agent/': Could not resolve host: github.com",
        "Network"
    },
    missing = {
        "remote: Repository not found.\nfatal: repository 'https://github.com/org/agent/' not found",
        "InvalidReference"
    },
    other = { "fatal: early EOF", "CloneFailed" },
)]
fn test_clone_failures_are_classified(stderr: &'static str, expected: &str) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let acquirer = RepositoryAcquirer::new(Arc::new(RejectingGit(stderr)), CleanupPolicy::default())
        .with_parent_dir(scratch.path());

    let err = runtime
        .block_on(acquirer.acquire(&SourceReference::new("https://github.com/org/agent")))
        .unwrap_err();

    let variant = match err {
        AcquisitionError::Authentication { .. } => "Authentication",
        AcquisitionError::Network { .. } => "Network",
        AcquisitionError::InvalidReference { .. } => "InvalidReference",
        AcquisitionError::CloneFailed { .. } => "CloneFailed",
        other => panic!("unexpected acquisition error: {:?}", other),
    };
    assert_eq!(variant, expected);
    assert_eq!(leftover_entries(scratch.path()), 0);
}

#[tokio::test]
async fn test_option_like_reference_rejected_before_clone() {
    let scratch = TempDir::new().unwrap();
    let git = Arc::new(FixtureGit::new(&[]));
    let acquirer = RepositoryAcquirer::new(git.clone(), CleanupPolicy::default()).with_parent_dir(scratch.path());

    let err = acquirer
        .acquire(&SourceReference::new("--upload-pack=touch /tmp/pwned"))
        .await
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::InvalidReference { .. }));
    assert!(git.destinations.lock().unwrap().is_empty());
    assert_eq!(leftover_entries(scratch.path()), 0);
}

#[tokio::test]
async fn test_missing_credential_help() {
    let pipeline = CoralizationPipeline::new(
        Arc::new(MockLLMClient::new()),
        Arc::new(FixtureGit::new(&[("main.py", "")])),
        Arc::new(RecordingEngine::default()),
        PipelineSettings::default(),
    );
    let request = CoralizationRequest::new(SourceReference::new("https://github.com/org/agent"), "agent");

    let err = pipeline.run(&request, std::future::pending()).await.unwrap_err();

    assert!(matches!(err, CoralizeError::MissingCredential { var } if var == API_KEY_ENV));
    assert!(err.help_message().contains("export OPENAI_API_KEY="));
}

#[tokio::test]
async fn test_agent_failure_during_generation() {
    let scratch = TempDir::new().unwrap();
    let client = MockLLMClient::with_responses(vec![
        MockResponse::text(r#"["main.py"]"#),
        MockResponse::error(BackendError::TimeoutError { seconds: 30 }),
    ]);
    let pipeline = CoralizationPipeline::new(
        Arc::new(client),
        Arc::new(FixtureGit::new(&[("main.py", "print('x')\n")])),
        Arc::new(RecordingEngine::default()),
        PipelineSettings::default(),
    )
    .with_workdir_parent(scratch.path());

    let err = pipeline
        .prepare(&CoralizationRequest::new(SourceReference::new("https://github.com/org/agent"), "agent"))
        .await
        .unwrap_err();

    assert!(matches!(err, CoralizeError::Generation(_)));
    assert_eq!(leftover_entries(scratch.path()), 0);
}

#[test]
fn test_cleanup_of_absent_directory_is_success() {
    let scratch = TempDir::new().unwrap();
    let policy = CleanupPolicy {
        attempts: 2,
        delay: Duration::from_millis(1),
    };

    let outcome = remove_dir_with_retry(&scratch.path().join("never-created"), policy);

    assert!(matches!(outcome, CleanupOutcome::AlreadyAbsent));
    assert!(outcome.is_clean());
}

#[test]
#[serial]
fn test_invalid_budget_rejected() {
    std::env::set_var("CORAL_MAX_TREE_CHARS", "2");
    let config = CoralConfig::default();
    std::env::remove_var("CORAL_MAX_TREE_CHARS");

    assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));
}

#[test]
#[serial]
fn test_cleanup_retries_bounded() {
    std::env::set_var("CORAL_CLEANUP_RETRIES", "0");
    let config = CoralConfig::default();
    std::env::remove_var("CORAL_CLEANUP_RETRIES");

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Cleanup retries"));
}
