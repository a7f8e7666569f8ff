//! Help and version output specs

use crate::prelude::*;
use predicates::prelude::*;

#[test]
fn help_describes_the_command() {
    cli()
        .args(["--help"])
        .passes()
        .stdout_has("take a lock over a configmap")
        .stdout_has("kube-lock [namespace] [configmap name]");
}

#[test]
fn help_lists_every_flag() {
    let run = cli().args(["--help"]).passes();
    let stdout = run.stdout();
    for flag in [
        "--kubeconfig-path",
        "--kubectl",
        "--holder-name",
        "--reason",
        "--max-holders",
        "--create-configmap",
        "--polling-interval",
        "--polling-timeout",
        "--run-once",
        "--unlock",
        "--verbose",
    ] {
        assert!(stdout.contains(flag), "help is missing {}", flag);
    }
}

#[test]
fn help_shows_environment_bindings() {
    cli()
        .args(["--help"])
        .passes()
        .stdout_has("KUBE_LOCK_MAX_HOLDERS")
        .stdout_has("KUBE_LOCK_POLLING_TIMEOUT");
}

#[test]
fn version_flag_passes() {
    kube_lock()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("kube-lock "));
}
