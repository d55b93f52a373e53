//! CLI tests for `codeflow init` and `codeflow review`.
//!
//! Spawns the codeflow binary and verifies exit codes and printed reports.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use codeflow::exit_codes;
use codeflow::io::config::{CodeflowConfig, load_config};
use codeflow_stub::{Endpoint, StubFixtures, spawn};

fn codeflow(dir: &Path, args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_codeflow"));
    command.current_dir(dir).args(args);
    command
}

/// Run the binary off the async runtime so the stub keeps serving.
async fn run_review(dir: &Path, base_url: String, file: &str) -> Output {
    let mut command = codeflow(dir, &["review", file, "--service-url", &base_url]);
    tokio::task::spawn_blocking(move || command.output().expect("codeflow review"))
        .await
        .expect("join")
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = codeflow(temp.path(), &["init"]).status().expect("init");
    assert_eq!(status.code(), Some(exit_codes::OK));
    let path = temp.path().join(".codeflow/config.toml");
    assert_eq!(load_config(&path).expect("load"), CodeflowConfig::default());

    fs::write(&path, "default_language = \"go\"\n").expect("edit");
    let status = codeflow(temp.path(), &["init"]).status().expect("init again");
    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(load_config(&path).expect("load").default_language, "go");

    let status = codeflow(temp.path(), &["init", "--force"])
        .status()
        .expect("init --force");
    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(load_config(&path).expect("load").default_language, "python");
}

#[test]
fn review_of_blank_file_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("blank.py"), "  \n\n").expect("write");

    let output = codeflow(temp.path(), &["review", "blank.py"])
        .output()
        .expect("review");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no code provided"), "{stderr}");
}

#[test]
fn review_of_missing_file_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = codeflow(temp.path(), &["review", "missing.py"])
        .output()
        .expect("review");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.py"));
}

#[test]
fn invalid_config_is_reported() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join(".codeflow")).expect("mkdir");
    fs::write(
        temp.path().join(".codeflow/config.toml"),
        "[service]\nrequest_timeout_secs = 0\n",
    )
    .expect("write");
    fs::write(temp.path().join("a.py"), "x=1\n").expect("write");

    let output = codeflow(temp.path(), &["review", "a.py"])
        .output()
        .expect("review");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("request_timeout_secs"));
}

#[tokio::test]
async fn review_of_clean_code_exits_ok() {
    let stub = spawn(StubFixtures::default()).await.expect("stub");
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("a.py"), "print('hi')\n").expect("write");

    let output = run_review(temp.path(), stub.base_url(), "a.py").await;
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Code is clean!"), "{stdout}");
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn review_with_remaining_issues_exits_two() {
    let fixtures = StubFixtures::default()
        .with(
            Endpoint::Analyze,
            200,
            r#"{"bugs": [{"severity": "high", "title": "SQL injection", "line": 3}]}"#,
        )
        .with(
            Endpoint::Verify,
            200,
            r#"{"is_clean": false, "summary": "partially fixed",
                "remaining_issues": [{"title": "Raw query", "description": "still concatenates"}],
                "quality_score": 42}"#,
        );
    let stub = spawn(fixtures).await.expect("stub");
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("db.py"), "cur.execute('x' + q)\n").expect("write");

    let output = run_review(temp.path(), stub.base_url(), "db.py").await;
    assert_eq!(output.status.code(), Some(exit_codes::ISSUES_REMAIN));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[high] SQL injection (L3)"), "{stdout}");
    assert!(stdout.contains("Raw query: still concatenates"), "{stdout}");
    assert!(stdout.contains("quality score: 42/100 (poor)"), "{stdout}");
}

#[tokio::test]
async fn review_with_failing_stage_exits_three() {
    let fixtures = StubFixtures::default()
        .with(
            Endpoint::Analyze,
            200,
            r#"{"bugs": [{"severity": "low", "title": "spacing"}]}"#,
        )
        .with(Endpoint::Fix, 502, "<html>bad gateway</html>");
    let stub = spawn(fixtures).await.expect("stub");
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("a.py"), "x=1\n").expect("write");

    let output = run_review(temp.path(), stub.base_url(), "a.py").await;
    assert_eq!(output.status.code(), Some(exit_codes::STAGE_FAILED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("review stopped at fix"), "{stderr}");
}
