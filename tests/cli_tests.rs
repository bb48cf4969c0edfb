
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use test_utils::{entry_names, MockPackage, TestFeed};

/// Helper to get the binary command, isolated from the user's configuration
fn relpack_cmd(config_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_relpack"));
    cmd.env("RELPACK_CONFIG_DIR", config_dir);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn setup_feed() -> (TestFeed, std::path::PathBuf) {
    let feed = TestFeed::new();
    feed.add_package(
        &MockPackage::new("Lib", "1.5.0")
            .with_lib("net45", "Lib.dll")
            .with_lib("winrt", "Lib.dll"),
    );
    let input = feed.add_input(
        &MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Lib", "[1.0,2.0)"),
    );
    (feed, input)
}

#[test]
fn test_release_command_default_output() {
    let (feed, input) = setup_feed();

    relpack_cmd(&feed.path().join("config"))
        .arg("release")
        .arg(&input)
        .arg("--packages")
        .arg(&feed.packages_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Release package created"))
        .stdout(predicate::str::contains("App-1.0.0-full.nupkg"))
        .stdout(predicate::str::contains("SHA256:"));

    let output = feed.work_dir.join("App-1.0.0-full.nupkg");
    assert!(output.exists());
    assert!(entry_names(&output).contains(&"lib/net45/Lib.dll".to_string()));
}

#[test]
fn test_release_command_output_directory() {
    let (feed, input) = setup_feed();
    let out_dir = feed.path().join("releases");
    fs::create_dir_all(&out_dir).unwrap();

    relpack_cmd(&feed.path().join("config"))
        .args(["release", "-p"])
        .arg(&feed.packages_dir)
        .arg("-o")
        .arg(&out_dir)
        .arg(&input)
        .assert()
        .success();

    assert!(out_dir.join("App-1.0.0-full.nupkg").exists());
}

#[test]
fn test_release_command_uses_configured_packages_dir() {
    let (feed, input) = setup_feed();
    let config_dir = feed.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        format!(
            "[store]\npackages_dir = {:?}\n",
            feed.packages_dir.display().to_string()
        ),
    )
    .unwrap();

    relpack_cmd(&config_dir)
        .arg("release")
        .arg(&input)
        .assert()
        .success();

    assert!(feed.work_dir.join("App-1.0.0-full.nupkg").exists());
}

#[test]
fn test_release_command_missing_dependency() {
    let feed = TestFeed::new();
    let input = feed.add_input(
        &MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Missing", "1.0"),
    );

    relpack_cmd(&feed.path().join("config"))
        .arg("release")
        .arg(&input)
        .arg("-p")
        .arg(&feed.packages_dir)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Couldn't find file for package"))
        .stderr(predicate::str::contains("Missing"));
}

#[test]
fn test_release_command_ambiguous_platform() {
    let feed = TestFeed::new();
    let input = feed.add_input(
        &MockPackage::new("App", "1.0.0")
            .with_lib("net40", "App.dll")
            .with_lib("net45", "App.dll"),
    );

    relpack_cmd(&feed.path().join("config"))
        .arg("release")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("targets multiple platforms"));

    assert!(!feed.work_dir.join("App-1.0.0-full.nupkg").exists());
}

#[test]
fn test_release_command_missing_input() {
    let feed = TestFeed::new();

    relpack_cmd(&feed.path().join("config"))
        .arg("release")
        .arg(feed.work_dir.join("Nope.1.0.0.nupkg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_deps_command() {
    let (feed, input) = setup_feed();

    relpack_cmd(&feed.path().join("config"))
        .arg("deps")
        .arg(&input)
        .arg("-p")
        .arg(&feed.packages_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Target platform: net45"))
        .stdout(predicate::str::contains("Lib 1.5.0"));
}

#[test]
fn test_config_set_and_show() {
    let feed = TestFeed::new();
    let config_dir = feed.path().join("config");

    relpack_cmd(&config_dir)
        .args(["config", "set", "store.selection", "highest-version"])
        .assert()
        .success();

    relpack_cmd(&config_dir)
        .args(["config", "set", "resolver.max_depth", "12"])
        .assert()
        .success();

    let saved = fs::read_to_string(config_dir.join("config.toml")).unwrap();
    assert!(saved.contains("highest-version"));
    assert!(saved.contains("max_depth = 12"));

    relpack_cmd(&config_dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("highest-version"))
        .stdout(predicate::str::contains("max_depth      = 12"));
}

#[test]
fn test_config_set_unknown_key() {
    let feed = TestFeed::new();

    relpack_cmd(&feed.path().join("config"))
        .args(["config", "set", "registry.url", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_completions_command() {
    let feed = TestFeed::new();

    relpack_cmd(&feed.path().join("config"))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("relpack"));
}
