//! `--unlock` specs

use crate::prelude::*;

#[test]
fn unlock_on_missing_configmap_succeeds() {
    let cluster = Cluster::empty();
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--unlock"])
        .passes();
    assert!(cluster.created().is_none());
}

#[test]
fn unlock_ignores_create_flag() {
    let cluster = Cluster::empty();
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--unlock", "--create-configmap"])
        .passes();
    assert!(cluster.created().is_none());
}

#[test]
fn unlock_removes_only_this_holder() {
    let cluster = Cluster::with_semaphore(2, &["runner-0", HOLDER]);
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--unlock"])
        .passes();

    let patches = cluster.calls_to("patch");
    assert_eq!(patches.len(), 1);
    assert!(patches[0].contains("runner-0"));
    assert!(!patches[0].contains(HOLDER));
}

#[test]
fn unlock_without_holding_writes_nothing() {
    let cluster = Cluster::with_semaphore(1, &["runner-0"]);
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--unlock"])
        .passes();
    assert!(cluster.calls_to("patch").is_empty());
}

#[test]
fn unlock_without_annotation_writes_nothing() {
    let cluster = Cluster::without_semaphore();
    cluster
        .kube_lock()
        .args(["ci", "deploy-lock", "--unlock"])
        .passes();
    assert!(cluster.calls_to("patch").is_empty());
}
