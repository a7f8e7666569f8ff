// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ConfigMap store driven through the kubectl binary

use super::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// How to reach the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeConnection {
    /// kubectl binary to run
    pub kubectl: PathBuf,
    /// Explicit kubeconfig; `None` lets kubectl pick its default or in-cluster config
    pub kubeconfig: Option<PathBuf>,
}

impl Default for KubeConnection {
    fn default() -> Self {
        Self {
            kubectl: PathBuf::from("kubectl"),
            kubeconfig: None,
        }
    }
}

impl KubeConnection {
    pub fn with_kubectl(mut self, kubectl: impl Into<PathBuf>) -> Self {
        self.kubectl = kubectl.into();
        self
    }

    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }
}

/// kubectl-backed document store.
///
/// Construction performs no I/O; every operation runs one kubectl process.
#[derive(Debug, Clone)]
pub struct KubectlStore {
    connection: KubeConnection,
}

impl KubectlStore {
    pub fn new(connection: KubeConnection) -> Self {
        Self { connection }
    }

    fn command(&self, namespace: &str) -> Command {
        let mut cmd = Command::new(&self.connection.kubectl);
        if let Some(path) = &self.connection.kubeconfig {
            cmd.arg("--kubeconfig").arg(path);
        }
        cmd.arg("--namespace").arg(namespace);
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl DocumentStore for KubectlStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Document, StoreError> {
        let output = self
            .command(namespace)
            .args(["get", "configmap", name, "--output", "json"])
            .output()
            .await
            .map_err(|e| StoreError::CommandFailed(e.to_string()))?;

        parse_configmap(&check(output)?)
    }

    async fn create(&self, namespace: &str, document: &Document) -> Result<Document, StoreError> {
        let mut child = self
            .command(namespace)
            .args(["create", "--filename", "-", "--output", "json"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StoreError::CommandFailed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(manifest(document).as_bytes())
                .await
                .map_err(|e| StoreError::CommandFailed(e.to_string()))?;
            // Dropping stdin closes the pipe so kubectl sees EOF
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| StoreError::CommandFailed(e.to_string()))?;

        parse_configmap(&check(output)?)
    }

    async fn patch_annotation(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
        resource_version: Option<&str>,
    ) -> Result<(), StoreError> {
        let patch = annotation_patch(key, value, resource_version);
        let output = self
            .command(namespace)
            .args(["patch", "configmap", name, "--type", "merge", "--patch"])
            .arg(patch)
            .output()
            .await
            .map_err(|e| StoreError::CommandFailed(e.to_string()))?;

        check(output).map(|_| ())
    }
}

/// Return stdout on success, otherwise classify stderr
fn check(output: Output) -> Result<Vec<u8>, StoreError> {
    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(classify_failure(&String::from_utf8_lossy(&output.stderr)))
    }
}

/// Map kubectl's `Error from server (Reason): ...` lines onto error kinds
pub(crate) fn classify_failure(stderr: &str) -> StoreError {
    let message = stderr.trim().to_string();
    if message.contains("(NotFound)") {
        StoreError::NotFound(message)
    } else if message.contains("(AlreadyExists)") {
        StoreError::AlreadyExists(message)
    } else if message.contains("(Conflict)") {
        StoreError::Conflict(message)
    } else {
        StoreError::CommandFailed(message)
    }
}

#[derive(Deserialize)]
struct ConfigMap {
    metadata: ObjectMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMeta {
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    resource_version: Option<String>,
    #[serde(default)]
    annotations: Option<BTreeMap<String, String>>,
}

pub(crate) fn parse_configmap(stdout: &[u8]) -> Result<Document, StoreError> {
    let cm: ConfigMap = serde_json::from_slice(stdout)
        .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
    Ok(Document {
        name: cm.metadata.name,
        namespace: cm.metadata.namespace,
        resource_version: cm.metadata.resource_version,
        annotations: cm.metadata.annotations.unwrap_or_default(),
    })
}

pub(crate) fn manifest(document: &Document) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": document.name,
            "namespace": document.namespace,
            "annotations": document.annotations,
        },
    })
    .to_string()
}

/// Merge patch touching only one annotation.
///
/// Including `resourceVersion` makes the API server reject the patch with a
/// Conflict when the object moved on since it was read.
pub(crate) fn annotation_patch(key: &str, value: &str, resource_version: Option<&str>) -> String {
    let mut metadata = serde_json::json!({ "annotations": { key: value } });
    if let Some(version) = resource_version {
        metadata["resourceVersion"] = serde_json::Value::from(version);
    }
    serde_json::json!({ "metadata": metadata }).to_string()
}

#[cfg(test)]
#[path = "kubectl_tests.rs"]
mod tests;
