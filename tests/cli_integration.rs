//! CLI integration tests
//!
//! Runs the built `coral` binary and checks parsing, exit codes and the
//! commands that work without network or docker.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn coral_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_coral"))
}

fn coral() -> Command {
    let mut cmd = Command::new(coral_bin());
    cmd.env_remove("RUST_LOG").env("CORAL_LOG_LEVEL", "error");
    cmd
}

#[test]
fn test_cli_help() {
    let output = coral().arg("--help").output().expect("Failed to execute coral");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["init", "version", "interface", "server", "coralize"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_version_command() {
    let output = coral().arg("version").output().expect("Failed to execute coral");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("Coral CLI version: {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_version_flag() {
    let output = coral().arg("--version").output().expect("Failed to execute coral");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_init_creates_project() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("my-agent");

    let output = coral()
        .args(["init", "--framework", "langgraph", "--language", "python", "-o"])
        .arg(&target)
        .output()
        .expect("Failed to execute coral");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(target.join("agent.py").is_file());
    assert!(target.join("prompts.py").is_file());
    assert!(String::from_utf8_lossy(&output.stdout).contains("agent.py"));
}

#[test]
fn test_init_unknown_template() {
    let dir = TempDir::new().unwrap();

    let output = coral()
        .args(["init", "--framework", "crewai", "-o"])
        .arg(dir.path())
        .output()
        .expect("Failed to execute coral");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("langgraph-python"));
}

#[test]
fn test_interface_to_stdout() {
    let output = coral()
        .args(["interface", "--coral-url", "http://localhost:4000/sse", "--agent-id", "ui"])
        .output()
        .expect("Failed to execute coral");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#"CORAL_SERVER_URL = "http://localhost:4000/sse""#));
    assert!(stdout.contains(r#"AGENT_ID = "ui""#));
}

#[test]
fn test_interface_to_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("interface_agent.py");

    let output = coral()
        .args(["interface", "-o"])
        .arg(&target)
        .output()
        .expect("Failed to execute coral");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(fs::read_to_string(target).unwrap().contains("user_interface_agent"));
}

#[test]
fn test_coralize_github_requires_credential() {
    let output = coral()
        .env_remove("OPENAI_API_KEY")
        .args(["coralize", "github", "https://github.com/org/agent", "--agent-id", "agent"])
        .output()
        .expect("Failed to execute coral");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("export OPENAI_API_KEY="));
}

#[test]
fn test_coralize_github_requires_agent_id() {
    let output = coral()
        .args(["coralize", "github", "https://github.com/org/agent"])
        .output()
        .expect("Failed to execute coral");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--agent-id"));
}

#[test]
fn test_server_missing_jar() {
    let dir = TempDir::new().unwrap();

    let output = coral()
        .args(["server", "--jar"])
        .arg(dir.path().join("coral-server.jar"))
        .output()
        .expect("Failed to execute coral");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_unknown_command() {
    let output = coral().arg("deploy").output().expect("Failed to execute coral");
    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
fn test_sigint_during_clone_removes_working_directory() {
    use std::os::unix::fs::PermissionsExt;
    use std::process::Stdio;
    use std::thread;
    use std::time::{Duration, Instant};

    let bin = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let git = bin.path().join("git");
    fs::write(
        &git,
        "#!/bin/sh\nfor arg; do dest=\"$arg\"; done\nprintf 'print(1)\\n' > \"$dest/main.py\"\nexec sleep 30\n",
    )
    .unwrap();
    fs::set_permissions(&git, fs::Permissions::from_mode(0o755)).unwrap();
    let path = format!("{}:{}", bin.path().display(), std::env::var("PATH").unwrap_or_default());

    let mut child = coral()
        .env("PATH", path)
        .env("TMPDIR", scratch.path())
        .env("OPENAI_API_KEY", "sk-test")
        .args(["coralize", "github", "https://github.com/org/agent", "--agent-id", "agent"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to execute coral");

    let cloned = |dir: &std::path::Path| {
        fs::read_dir(dir)
            .map(|entries| entries.flatten().any(|e| e.path().join("main.py").is_file()))
            .unwrap_or(false)
    };
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cloned(scratch.path()) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
    assert!(cloned(scratch.path()), "fake clone never started");

    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let deadline = Instant::now() + Duration::from_secs(15);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().ok();
            panic!("coral did not exit after SIGINT");
        }
        thread::sleep(Duration::from_millis(50));
    };

    assert_eq!(status.code(), Some(130));
    let leftovers: Vec<_> = fs::read_dir(scratch.path())
        .unwrap()
        .flatten()
        .map(|e| e.file_name())
        .filter(|name| name.to_string_lossy().starts_with("coral_git_"))
        .collect();
    assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
}

