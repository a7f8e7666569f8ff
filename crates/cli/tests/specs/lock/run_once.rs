//! `--run-once` specs
//!
//! One attempt, exit 0 when holding a slot and 3 when the semaphore is full.

use crate::prelude::*;

#[test]
fn missing_configmap_fails_without_create_flag() {
    let cluster = Cluster::empty();
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--run-once"])
        .exits_with(2)
        .stderr_has("not found")
        .stderr_has("--create-configmap");
    assert!(cluster.created().is_none());
    assert!(cluster.calls_to("patch").is_empty());
}

#[test]
fn missing_configmap_is_created_when_asked() {
    let cluster = Cluster::empty();
    cluster
        .kube_lock()
        .args([
            "ci",
            "deploy-lock",
            "--run-once",
            "--create-configmap",
            "--max-holders",
            "3",
        ])
        .passes();

    let created = cluster.created().unwrap();
    assert!(created.contains("\"name\":\"deploy-lock\""));
    assert!(created.contains("kube-lock"));
    assert!(created.contains("\\\"max\\\":3"));

    let patches = cluster.calls_to("patch");
    assert_eq!(patches.len(), 1);
    assert!(patches[0].contains(HOLDER));
}

#[test]
fn free_slot_is_taken() {
    let cluster = Cluster::with_semaphore(2, &["runner-0"]);
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--run-once", "--reason", "nightly deploy"])
        .passes();

    let patches = cluster.calls_to("patch");
    assert_eq!(patches.len(), 1);
    assert!(patches[0].contains(HOLDER));
    assert!(patches[0].contains("runner-0"));
    assert!(patches[0].contains("nightly deploy"));
    assert!(patches[0].contains("\"resourceVersion\":\"7\""));
}

#[test]
fn full_semaphore_exits_with_three() {
    let cluster = Cluster::with_semaphore(1, &["runner-0"]);
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--run-once"])
        .exits_with(3);
    assert!(cluster.calls_to("patch").is_empty());
}

#[test]
fn existing_holder_is_not_rewritten() {
    let cluster = Cluster::with_semaphore(1, &[HOLDER]);
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--run-once"])
        .passes();
    assert!(cluster.calls_to("patch").is_empty());
}

#[test]
fn stored_max_wins_over_flag() {
    let cluster = Cluster::with_semaphore(1, &["runner-0"]);
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--run-once", "--max-holders", "5"])
        .exits_with(3);
}

#[test]
fn corrupt_annotation_is_reported_and_left_alone() {
    let cluster = Cluster::with_annotation("not json");
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--run-once"])
        .exits_with(2)
        .stderr_has("cannot decode semaphore");
    assert!(cluster.calls_to("patch").is_empty());
}

#[test]
fn kubeconfig_and_namespace_reach_kubectl() {
    let cluster = Cluster::with_semaphore(1, &[]);
    cluster
        .kube_lock()
        .args([
            "ci",
            "deploy-lock",
            "--run-once",
            "--kubeconfig-path",
            "/etc/kube/config",
        ])
        .passes();

    let gets = cluster.calls_to("get");
    assert_eq!(gets.len(), 1);
    assert!(gets[0].contains("--kubeconfig /etc/kube/config"));
    assert!(gets[0].contains("--namespace ci"));
}

#[test]
fn configmap_without_semaphore_gets_one() {
    let cluster = Cluster::without_semaphore();
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--run-once", "--max-holders", "2"])
        .passes();

    let patches = cluster.calls_to("patch");
    assert_eq!(patches.len(), 1);
    assert!(patches[0].contains(HOLDER));
    assert!(patches[0].contains("\\\"max\\\":2"));
}

#[test]
fn empty_kubeconfig_uses_default_context() {
    let cluster = Cluster::with_semaphore(1, &[]);
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--run-once", "--kubeconfig-path", ""])
        .passes();

    let gets = cluster.calls_to("get");
    assert_eq!(gets.len(), 1);
    assert!(!gets[0].contains("--kubeconfig"));
}
