//! Binary-level tests for argument handling, exit codes and the result file.

mod utils;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::TempDir;
use utils::{json_ok, query_param, requests, set_handler, sqi_cmd, start_mock};

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().expect("tempdir");
    sqi_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("issues").and(contains("pr")))
        .stdout(contains("--sonar-public"));
}

#[test]
fn malformed_pr_link_is_a_configuration_error() {
    let dir = TempDir::new().expect("tempdir");
    sqi_cmd(dir.path())
        .args([
            "--sonar-url",
            "http://127.0.0.1:9",
            "--sonar-token",
            "squ_test",
            "--sonar-project-key",
            "widget",
            "issues",
            "--branch",
            "topic",
            "--pr-link",
            "https://sonar.example.com/project/issues?id=widget",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("error: configuration error"))
        .stderr(contains("pullRequest=<key>"));
    assert!(!dir.path().join("sonar-issues.json").exists());
}

#[test]
fn private_mode_requires_a_token() {
    let dir = TempDir::new().expect("tempdir");
    sqi_cmd(dir.path())
        .args([
            "--sonar-url",
            "https://sonar.example.com",
            "--sonar-project-key",
            "widget",
            "issues",
            "--branch",
            "topic",
        ])
        .assert()
        .failure()
        .stderr(contains("configuration error").and(contains("token")));
}

#[test]
fn public_flag_without_organization_fails() {
    let dir = TempDir::new().expect("tempdir");
    sqi_cmd(dir.path())
        .args([
            "--sonar-public",
            "--sonar-project-key",
            "widget",
            "issues",
            "--branch",
            "topic",
        ])
        .assert()
        .failure()
        .stderr(contains("organization"));
}

#[test]
fn pr_subcommand_ignores_branch_digits_without_provider() {
    let dir = TempDir::new().expect("tempdir");
    sqi_cmd(dir.path())
        .args(["pr", "--branch", "feature/1234-login"])
        .assert()
        .success()
        .stdout(contains(
            "no pull request found for branch 'feature/1234-login'",
        ));
}

#[tokio::test]
async fn pr_subcommand_infers_from_branch_when_provider_has_none() {
    let (addr, handler, log, shutdown) = start_mock().await.expect("start server");
    set_handler(&handler, |_req| json_ok(&json!([])));
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().to_path_buf();

    tokio::time::timeout(
        Duration::from_secs(10),
        tokio::task::spawn_blocking(move || {
            sqi_cmd(&path)
                .args([
                    "--provider",
                    "github",
                    "--repo",
                    "octo/hello",
                    "--github-token",
                    "gh-token",
                    "--github-api-url",
                    &format!("http://{addr}"),
                    "pr",
                    "--branch",
                    "feature/1234-login",
                ])
                .assert()
                .success()
                .stdout(contains(
                    "pull request #1234 (inferred from branch name) for branch 'feature/1234-login'",
                ));
        }),
    )
    .await
    .expect("command timed out")
    .expect("command task");

    let pulls = requests(&log);
    assert_eq!(pulls.len(), 2);
    assert!(pulls.iter().all(|t| t.starts_with("/repos/octo/hello/pulls")));
    shutdown.shutdown().await;
}

#[test]
fn pr_subcommand_reports_nothing_found() {
    let dir = TempDir::new().expect("tempdir");
    sqi_cmd(dir.path())
        .args(["pr", "--branch", "main"])
        .assert()
        .success()
        .stdout(contains("no pull request found for branch 'main'"));
}

#[tokio::test]
async fn issues_writes_result_file_and_summary() {
    let (addr, handler, log, shutdown) = start_mock().await.expect("start server");
    set_handler(&handler, |_req| {
        json_ok(&json!({
            "total": 3,
            "issues": [
                {"key": "A", "severity": "MAJOR", "rule": "rust:S100"},
                {"key": "B", "severity": "MAJOR"},
                {"key": "C", "severity": "CRITICAL"}
            ]
        }))
    });
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().to_path_buf();

    tokio::time::timeout(
        Duration::from_secs(10),
        tokio::task::spawn_blocking(move || {
            sqi_cmd(&path)
                .env("SONAR_TOKEN", "squ_env")
                .args([
                    "--sonar-url",
                    &format!("http://{addr}/project/issues?id=widget"),
                    "--sonar-project-key",
                    "widget",
                    "--sonar-organization",
                    "acme",
                    "issues",
                    "--branch",
                    "topic",
                    "--output",
                    "out.json",
                ])
                .assert()
                .success()
                .stdout(contains("3 issues from topic"))
                .stdout(contains("MAJOR: 2"))
                .stdout(contains("CRITICAL: 1"));
        }),
    )
    .await
    .expect("command timed out")
    .expect("command task");

    let written: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("out.json")).expect("read result"),
    )
    .expect("result json");
    assert_eq!(written["source"], "topic");
    assert_eq!(written["target"], json!({"kind": "branch", "value": "topic"}));
    assert_eq!(written["total"], 3);
    assert_eq!(written["issues"][0]["rule"], "rust:S100");
    assert!(written["fetched_at"].is_string());

    let log = requests(&log);
    let target = log.first().expect("sonar request");
    assert_eq!(query_param(target, "components").as_deref(), Some("acme/widget"));
    assert_eq!(query_param(target, "timeZone").as_deref(), Some("UTC"));
    assert_eq!(query_param(target, "pullRequest"), None);
    shutdown.shutdown().await;
}
