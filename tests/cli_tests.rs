//! CLI smoke tests exercising the nupm binary end to end


use assert_cmd::Command;
use predicates::prelude::*;
use test_utils::TestProject;

/// Helper to get the binary command
fn nupm_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_nupm"))
}

#[test]
fn test_init_command() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");

    nupm_cmd()
        .current_dir(&temp_dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created NuGet.config"));

    assert!(temp_dir.path().join("NuGet.config").exists());
    assert!(temp_dir.path().join("packages.config").exists());
}

#[test]
fn test_list_without_project() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");

    nupm_cmd()
        .current_dir(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages.config found"));
}

#[test]
fn test_install_dry_run_changes_nothing() {
    let project = TestProject::new();
    project.add_package("Alpha", "1.0", &[]);

    nupm_cmd()
        .current_dir(&project.project_path)
        .args(["install", "Alpha@1.0", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha 1.0.0"))
        .stdout(predicate::str::contains("Dry run"));

    assert!(!project.content_dir("Alpha", "1.0").exists());
    assert!(!project.project_path.join("packages.config").exists());
}

#[test]
fn test_install_without_version_picks_latest() {
    let project = TestProject::new();
    project.add_package("Alpha", "1.0", &[]);
    project.add_package("Alpha", "2.0", &[]);

    nupm_cmd()
        .current_dir(&project.project_path)
        .args(["install", "Alpha", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha 2.0.0"));
}

#[test]
fn test_install_then_list_and_uninstall() {
    let project = TestProject::new();
    project.add_package("Alpha", "1.0", &[]);

    nupm_cmd()
        .current_dir(&project.project_path)
        .args(["install", "Alpha@1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed 1 package"));

    nupm_cmd()
        .current_dir(&project.project_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha @ 1.0.0"));

    nupm_cmd()
        .current_dir(&project.project_path)
        .args(["uninstall", "Alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully uninstalled Alpha"));

    assert!(!project.content_dir("Alpha", "1.0").exists());
}

#[test]
fn test_install_unknown_package_reports_error() {
    let project = TestProject::new();

    nupm_cmd()
        .current_dir(&project.project_path)
        .args(["install", "Ghost@1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ghost"));
}

#[test]
fn test_search_finds_local_feed_packages() {
    let project = TestProject::new();
    project.add_package("Newtonsoft.Json", "13.0.1", &[]);

    nupm_cmd()
        .current_dir(&project.project_path)
        .args(["search", "newtonsoft"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Newtonsoft.Json 13.0.1"));
}
