use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn devspace_sweeper() -> Command {
    Command::cargo_bin("devspace-sweeper").unwrap()
}

#[test]
fn shows_help() {
    devspace_sweeper()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("devspace-sweeper"))
        .stdout(predicate::str::contains("dev junk"));
}

#[test]
fn shows_version() {
    devspace_sweeper()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn requires_subcommand() {
    devspace_sweeper()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn sweep_subcommand_help() {
    devspace_sweeper()
        .args(["sweep", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--rule"));
}

#[test]
fn gen_ignore_subcommand_help() {
    devspace_sweeper()
        .args(["gen-ignore", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".gitignore"));
}

#[test]
fn verbose_flag_accepted() {
    let tmp = TempDir::new().unwrap();
    devspace_sweeper()
        .args(["-vvv", "scan", "--root"])
        .arg(tmp.path())
        .assert()
        .success();
}

#[test]
fn invalid_config_path_fails() {
    devspace_sweeper()
        .args(["--config", "/nonexistent/config.toml", "rules"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

#[test]
fn log_file_that_cannot_be_opened_fails() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.toml");
    // a directory cannot be opened for appending
    std::fs::write(&config, format!("log_file = '{}'\n", tmp.path().display())).unwrap();

    devspace_sweeper()
        .arg("--config")
        .arg(&config)
        .arg("rules")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("IO error at path"));
}

#[test]
fn missing_root_fails() {
    devspace_sweeper()
        .args(["sweep", "--dry-run", "--root", "/nonexistent/devspace-sweeper/root"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid root"));
}

#[test]
fn file_root_fails() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("file.txt");
    std::fs::write(&file, "x").unwrap();

    devspace_sweeper()
        .args(["sweep", "--root"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn unknown_rule_lists_valid_ids() {
    let tmp = TempDir::new().unwrap();
    devspace_sweeper()
        .args(["sweep", "--dry-run", "--rule", "no-such-rule", "--root"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-rule"))
        .stderr(predicate::str::contains("node_modules"));
}

#[test]
fn rules_lists_builtin_catalog() {
    devspace_sweeper()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("node_modules"))
        .stdout(predicate::str::contains("__pycache__"))
        .stdout(predicate::str::contains("target"));
}

#[test]
fn rules_json_is_valid() {
    let output = devspace_sweeper().args(["rules", "--json"]).output().unwrap();
    assert!(output.status.success());

    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = rules
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"node_modules"));
}
