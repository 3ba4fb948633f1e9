//! CLI tests for the fc binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DATASET: &str = r#"[["term","reading","frequency","value"],[["日本","にほん",50,1.0],["日本語","にほんご",300,1.0],["猫","ねこ",900,1.0]]]"#;

/// Data directory with a plain dataset, plus a config pointing storage into `temp`
fn setup(temp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let data = temp.path().join("jpdb");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("version.json"), "v1\n").unwrap();
    fs::write(data.join("JPDB.json"), DATASET).unwrap();

    let config = temp.path().join("fc.yml");
    let storage = temp.path().join("store");
    fs::write(
        &config,
        format!(
            "storage:\n  db-path: {}\n  marker-path: {}\ncache:\n  auto-initialize: false\n",
            storage.join("frequencies.db").display(),
            storage.join("jpdb-version").display()
        ),
    )
    .unwrap();
    (data, config)
}

fn fc(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fc").unwrap();
    // Keep the log file out of the real home directory
    cmd.env("HOME", home)
        .env("XDG_DATA_HOME", home.join("share"))
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    fc(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("lookup"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("reload"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_init_then_lookup_from_dir() {
    let temp = TempDir::new().unwrap();
    let (data, config) = setup(&temp);

    fc(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("--from-dir")
        .arg(&data)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 entries"));

    fc(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("--from-dir")
        .arg(&data)
        .args(["lookup", "猫", "犬"])
        .assert()
        .success()
        .stdout(predicate::str::contains("猫\t900"))
        .stdout(predicate::str::contains("犬\t-"));
}

#[test]
fn test_search_from_dir() {
    let temp = TempDir::new().unwrap();
    let (data, config) = setup(&temp);

    fc(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("--from-dir")
        .arg(&data)
        .arg("init")
        .assert()
        .success();

    fc(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("--from-dir")
        .arg(&data)
        .args(["search", "日本"])
        .assert()
        .success()
        .stdout(predicate::str::contains("日本語"))
        .stdout(predicate::str::contains("にほん\t").not());
}

#[test]
fn test_status_before_init() {
    let temp = TempDir::new().unwrap();
    let (data, config) = setup(&temp);

    fc(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("--from-dir")
        .arg(&data)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries: 0"));
}

#[test]
fn test_missing_config_fails() {
    let temp = TempDir::new().unwrap();
    fc(temp.path())
        .arg("--config")
        .arg(temp.path().join("missing.yml"))
        .arg("status")
        .assert()
        .failure();
}
