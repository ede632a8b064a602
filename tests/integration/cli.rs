use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn check_prints_the_launch_command() {
    let temp = tempdir().expect("failed to create tempdir");
    let jar = temp.path().join("server.jar");
    fs::write(&jar, b"").expect("failed to write jar");

    let config_path = temp.path().join("server.yaml");
    fs::write(
        &config_path,
        format!(
            "jar: \"{}\"\nmin_ram: \"2G\"\nmax_ram: \"3G\"\n",
            jar.display()
        ),
    )
    .expect("failed to write config");

    let output = Command::new(assert_cmd::cargo::cargo_bin!("craftd"))
        .arg("check")
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .output()
        .expect("failed to execute check");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(predicate::str::contains("-Xms2G").eval(&stdout));
    assert!(predicate::str::contains("-Xmx3G").eval(&stdout));
    assert!(predicate::str::contains("--nogui").eval(&stdout));
    assert!(
        predicate::str::contains(temp.path().to_string_lossy().as_ref()).eval(&stdout),
        "working directory should be the jar's directory"
    );
}

#[test]
fn check_fails_for_a_missing_jar() {
    let temp = tempdir().expect("failed to create tempdir");
    let config_path = temp.path().join("server.yaml");
    fs::write(&config_path, "jar: \"/nowhere/server.jar\"\n")
        .expect("failed to write config");

    let output = Command::new(assert_cmd::cargo::cargo_bin!("craftd"))
        .arg("check")
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .output()
        .expect("failed to execute check");

    assert!(!output.status.success());
}

#[test]
fn help_lists_subcommands() {
    let output = Command::new(assert_cmd::cargo::cargo_bin!("craftd"))
        .arg("--help")
        .output()
        .expect("failed to execute help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(predicate::str::contains("run").eval(&stdout));
    assert!(predicate::str::contains("check").eval(&stdout));
}
