use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("load-generator").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Generate system load"))
        .stdout(predicate::str::contains("--intensity"));
}

#[test]
fn test_rejects_unknown_load_type() {
    let mut cmd = Command::cargo_bin("load-generator").unwrap();
    cmd.args(["--type", "gpu"]);
    cmd.assert().failure().stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_rejects_intensity_out_of_range() {
    let mut cmd = Command::cargo_bin("load-generator").unwrap();
    cmd.args(["--intensity", "101"]);
    cmd.assert().failure();

    let mut cmd = Command::cargo_bin("load-generator").unwrap();
    cmd.args(["--intensity", "0"]);
    cmd.assert().failure();
}

#[test]
fn test_short_cpu_run_completes() {
    let mut cmd = Command::cargo_bin("load-generator").unwrap();
    cmd.args(["--type", "cpu", "--duration", "1", "--intensity", "1"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Starting load generator with cpu load"))
        .stdout(predicate::str::contains("CPU load generation completed"))
        .stdout(predicate::str::contains("Load generation completed"));
}
