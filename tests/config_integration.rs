use assert_cmd::Command;
use devspace_sweeper::config::Config;
use devspace_sweeper::rules::RuleCatalog;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn parse_complete_config_file() {
    let config_content = r#"
log_file = "/tmp/devspace-sweeper.log"

[scan]
max_depth = 5
one_file_system = true

[safety]
protected_trees = ["/opt/keep"]
protected_names = [".git", ".jj"]
keep_marker = ".keep-me"
check_processes = false
skip_if_free_above = 75.0

[execute]
jobs = 2
entry_timeout_secs = 30

[catalog]
builtin = true
disabled = ["venv"]

[[rules]]
id = "logs"
patterns = ["*.log"]
applies_to = "file"
min_age_days = 7
min_size = "1MB"
gitignore = "*.log"
"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config_content.as_bytes()).unwrap();

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.scan.max_depth, 5);
    assert!(config.scan.one_file_system);
    assert_eq!(config.safety.keep_marker.as_deref(), Some(".keep-me"));
    assert!(!config.safety.check_processes);
    assert_eq!(config.safety.skip_if_free_above, Some(75.0));
    assert_eq!(config.execute.jobs, 2);
    assert_eq!(config.execute.entry_timeout_secs, Some(30));
    assert_eq!(config.rules.len(), 1);
    assert_eq!(config.rules[0].min_size, 1024 * 1024);

    let catalog = RuleCatalog::from_config(&config).unwrap();
    assert!(catalog.get("logs").is_some());
    assert!(catalog.get("venv").is_none());
}

#[test]
fn parse_partial_config_uses_defaults() {
    let config_content = r#"
[scan]
max_depth = 3
"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config_content.as_bytes()).unwrap();

    let config = Config::load(Some(file.path())).unwrap();

    // Explicit value
    assert_eq!(config.scan.max_depth, 3);
    // Default values
    assert_eq!(config.execute.jobs, 1);
    assert!(config.catalog.builtin);
    assert!(config.safety.protected_names.contains(&".git".to_string()));
}

#[test]
fn parse_invalid_toml_returns_error() {
    let config_content = "this is not valid toml [[[";

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config_content.as_bytes()).unwrap();

    let result = Config::load(Some(file.path()));
    assert!(result.is_err());
}

#[test]
fn parse_invalid_jobs_returns_error() {
    let config_content = r#"
[execute]
jobs = 0
"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config_content.as_bytes()).unwrap();

    let result = Config::load(Some(file.path()));
    assert!(result.is_err());
}

#[test]
fn config_rules_are_used_by_the_binary() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("svc/tmp-cache")).unwrap();
    fs::write(tmp.path().join("svc/tmp-cache/blob"), "data").unwrap();

    let config_path = tmp.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[catalog]
builtin = false

[[rules]]
id = "tmp-cache"
patterns = ["tmp-cache"]
"#,
    )
    .unwrap();

    Command::cargo_bin("devspace-sweeper")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .args(["sweep", "--root"])
        .arg(tmp.path())
        .assert()
        .success();

    assert!(!tmp.path().join("svc/tmp-cache").exists());
    assert!(config_path.exists());
}

#[test]
fn invalid_rule_in_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[[rules]]
id = "broken"
patterns = ["a["]
"#,
    )
    .unwrap();

    Command::cargo_bin("devspace-sweeper")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .args(["sweep", "--dry-run", "--root"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken"));
}
