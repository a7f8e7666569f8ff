// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document store capability backing the semaphore

mod kubectl;

pub use kubectl::{KubeConnection, KubectlStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDocumentStore, StoreCall};

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from document store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// The document changed since it was read (resource version mismatch)
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Another participant wrote first; re-reading and retrying may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_) | StoreError::AlreadyExists(_))
    }
}

/// The parts of a ConfigMap the lock protocol looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub namespace: String,
    /// Opaque version assigned by the store, used as a write precondition
    pub resource_version: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

impl Document {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// Get/create/patch access to named documents within a namespace
#[async_trait]
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Fetch a document; a missing one is reported as [`StoreError::NotFound`]
    async fn get(&self, namespace: &str, name: &str) -> Result<Document, StoreError>;

    /// Create a document and return it as stored
    async fn create(&self, namespace: &str, document: &Document) -> Result<Document, StoreError>;

    /// Merge-patch a single annotation, leaving every other field untouched.
    ///
    /// When `resource_version` is given the write only applies if the
    /// document is still at that version, otherwise it fails with
    /// [`StoreError::Conflict`].
    async fn patch_annotation(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
        resource_version: Option<&str>,
    ) -> Result<(), StoreError>;
}
