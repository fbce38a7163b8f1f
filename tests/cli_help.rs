use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn cli_help_runs() {
    let mut cmd = Command::cargo_bin("bag2record").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("record"));
}

#[test]
fn cli_version_matches_package() {
    let mut cmd = Command::cargo_bin("bag2record").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_requires_bag_argument() {
    let mut cmd = Command::cargo_bin("bag2record").unwrap();
    cmd.assert().failure();
}

#[test]
fn cli_rejects_extra_arguments() {
    let mut cmd = Command::cargo_bin("bag2record").unwrap();
    cmd.args(["a.bag", "b.bag"]).assert().failure();
}
