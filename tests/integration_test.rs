// tests/integration_test.rs
mod common;

use common::TestRepo;
use std::path::Path;
use std::process::{Command, Output};

fn gitversion(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gitversion"))
        .arg("--target-path")
        .arg(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute gitversion")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is utf-8")
}

/// main: v1.0.0 on the root, then one unmarked commit
fn tagged_repo() -> TestRepo {
    let mut repo = TestRepo::new();
    repo.commit("Initial commit");
    repo.tag("v1.0.0");
    repo.commit("Update readme");
    repo
}

#[test]
fn test_gitversion_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_gitversion"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("gitversion"));
    assert!(stdout.contains("--show-variable"));
}

#[test]
fn test_json_output() {
    let repo = tagged_repo();
    let output = gitversion(repo.path(), &[]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid json");
    assert_eq!(json["SemVer"], "1.0.1");
    assert_eq!(json["FullSemVer"], "1.0.1+1");
    assert_eq!(json["BranchName"], "main");
    assert_eq!(json["CommitsSinceVersionSource"], "1");
}

#[test]
fn test_dotenv_output() {
    let repo = tagged_repo();
    let output = gitversion(repo.path(), &["--output", "dotenv"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("GitVersion_MajorMinorPatch=1.0.1\n"));
    assert!(stdout.contains("GitVersion_PreReleaseTag=\"\"\n"));
}

#[test]
fn test_show_variable() {
    let repo = tagged_repo();
    let output = gitversion(repo.path(), &["--show-variable", "FullSemVer"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "1.0.1+1\n");

    let output = gitversion(repo.path(), &["--show-variable", "NoSuchThing"]);
    assert!(!output.status.success());
}

#[test]
fn test_show_config() {
    let repo = tagged_repo();
    let output = gitversion(repo.path(), &["--show-config"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("tag_prefix"));
    assert!(stdout.contains("[branches.feature]"));
}

#[test]
fn test_commit_and_branch_selection() {
    let mut repo = TestRepo::new();
    let root = repo.commit("Initial commit");
    repo.tag("v1.0.0");
    repo.commit("Update readme");

    let short = root.to_string()[..10].to_string();
    let output = gitversion(
        repo.path(),
        &["--branch", "main", "--commit", &short, "--show-variable", "SemVer"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output), "1.0.0\n");
}

#[test]
fn test_feature_branch_in_real_repository() {
    let mut repo = tagged_repo();
    repo.branch("feature/login");
    repo.commit("Add login form");

    let output = gitversion(repo.path(), &["--show-variable", "FullSemVer"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output), "1.0.2-login.1+1\n");
}

#[test]
fn test_annotated_tag_in_real_repository() {
    let mut repo = TestRepo::new();
    repo.commit("Initial commit");
    repo.annotated_tag("v2.0.0", "Release 2.0.0");

    let output = gitversion(repo.path(), &["--show-variable", "FullSemVer"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "2.0.0\n");
}

#[test]
fn test_not_a_repository_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = gitversion(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_invalid_config_fails() {
    let repo = tagged_repo();
    let config_path = repo.path().join("broken.toml");
    std::fs::write(&config_path, "[branches.feature]\nregex = \"(\"\n").unwrap();

    let output = gitversion(repo.path(), &["--config", config_path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid branch configuration"));
}
