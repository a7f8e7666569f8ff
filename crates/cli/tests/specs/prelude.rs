//! Shared helpers for CLI specs
//!
//! A `Cluster` is a temp directory holding a fake `kubectl` script. The script
//! serves one ConfigMap from `configmap.json`, answers NotFound when that file
//! is absent, echoes created manifests back, and accepts every patch. Each
//! invocation is appended to `calls.log`.

use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;

pub const HOLDER: &str = "runner-1";

const FAKE_KUBECTL: &str = r#"#!/bin/sh
dir="$(dirname "$0")"
echo "$@" >> "$dir/calls.log"
verb=""
for arg in "$@"; do
  case "$arg" in
    get|create|patch) verb="$arg"; break ;;
  esac
done
case "$verb" in
  get)
    if [ -f "$dir/configmap.json" ]; then
      cat "$dir/configmap.json"
    else
      echo 'Error from server (NotFound): configmaps "deploy-lock" not found' >&2
      exit 1
    fi
    ;;
  create)
    cat > "$dir/created.json"
    cat "$dir/created.json"
    ;;
  patch)
    ;;
  *)
    echo "unexpected call: $*" >&2
    exit 1
    ;;
esac
"#;

pub struct Cluster {
    dir: TempDir,
}

impl Cluster {
    /// No ConfigMap exists yet
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let kubectl = dir.path().join("kubectl");
        fs::write(&kubectl, FAKE_KUBECTL).unwrap();
        fs::set_permissions(&kubectl, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    /// ConfigMap whose semaphore annotation has the given holders
    pub fn with_semaphore(max: i64, holders: &[&str]) -> Self {
        let holders: serde_json::Map<String, serde_json::Value> = holders
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    serde_json::json!({ "date": "2026-01-01T00:00:00Z", "reason": "" }),
                )
            })
            .collect();
        let annotation = serde_json::json!({ "max": max, "holders": holders }).to_string();
        Self::with_annotation(&annotation)
    }

    /// ConfigMap carrying a raw `kube-lock` annotation
    pub fn with_annotation(annotation: &str) -> Self {
        Self::with_annotations(serde_json::json!({ "kube-lock": annotation }))
    }

    /// ConfigMap with no semaphore annotation yet
    pub fn without_semaphore() -> Self {
        Self::with_annotations(serde_json::json!({ "owner": "platform" }))
    }

    fn with_annotations(annotations: serde_json::Value) -> Self {
        let cluster = Self::empty();
        let configmap = serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "deploy-lock",
                "namespace": "ci",
                "resourceVersion": "7",
                "annotations": annotations,
            },
        });
        fs::write(cluster.path().join("configmap.json"), configmap.to_string()).unwrap();
        cluster
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn kubectl(&self) -> PathBuf {
        self.path().join("kubectl")
    }

    /// kube-lock wired to this cluster, with a fixed holder name
    pub fn kube_lock(&self) -> CliBuilder {
        let mut cmd = kube_lock();
        cmd.env("KUBE_LOCK_KUBECTL", self.kubectl())
            .env("KUBE_LOCK_HOLDER_NAME", HOLDER);
        CliBuilder { cmd }
    }

    /// Every kubectl invocation so far, one per line
    pub fn calls(&self) -> String {
        fs::read_to_string(self.path().join("calls.log")).unwrap_or_default()
    }

    /// Lines of `calls.log` for one verb
    pub fn calls_to(&self, verb: &str) -> Vec<String> {
        self.calls()
            .lines()
            .filter(|line| line.split_whitespace().any(|word| word == verb))
            .map(str::to_string)
            .collect()
    }

    /// Manifest passed to `kubectl create`, if any
    pub fn created(&self) -> Option<String> {
        fs::read_to_string(self.path().join("created.json")).ok()
    }
}

/// Bare kube-lock command with the ambient configuration scrubbed
pub fn kube_lock() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kube-lock"));
    cmd.env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("KUBE_LOCK_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

pub fn cli() -> CliBuilder {
    CliBuilder { cmd: kube_lock() }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn exits_with(mut self, code: i32) -> RunAssert {
        let output = self.cmd.output().unwrap();
        assert_eq!(
            output.status.code(),
            Some(code),
            "unexpected exit status\nstderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout:\n{}",
            expected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr:\n{}",
            expected,
            stderr
        );
        self
    }
}
