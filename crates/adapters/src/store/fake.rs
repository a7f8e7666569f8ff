// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory document store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get {
        namespace: String,
        name: String,
    },
    Create {
        namespace: String,
        name: String,
    },
    PatchAnnotation {
        namespace: String,
        name: String,
        key: String,
        value: String,
        resource_version: Option<String>,
    },
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreCall::Get { .. })
    }
}

#[derive(Default)]
struct FakeState {
    documents: HashMap<(String, String), Document>,
    calls: Vec<StoreCall>,
    version: u64,
    get_failures: VecDeque<StoreError>,
    create_failures: VecDeque<StoreError>,
    patch_failures: VecDeque<StoreError>,
}

impl FakeState {
    fn next_version(&mut self) -> String {
        self.version += 1;
        self.version.to_string()
    }
}

/// Fake document store with versioning and call recording.
///
/// Every write bumps the document's resource version, and versioned patches
/// fail with [`StoreError::Conflict`] when the version has moved on.
#[derive(Clone, Default)]
pub struct FakeDocumentStore {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a document, assigning it a fresh resource version
    pub fn insert(&self, mut document: Document) {
        let mut state = self.lock();
        document.resource_version = Some(state.next_version());
        state.documents.insert(
            (document.namespace.clone(), document.name.clone()),
            document,
        );
    }

    /// Seed a document without a resource version
    pub fn insert_unversioned(&self, mut document: Document) {
        document.resource_version = None;
        self.lock().documents.insert(
            (document.namespace.clone(), document.name.clone()),
            document,
        );
    }

    pub fn document(&self, namespace: &str, name: &str) -> Option<Document> {
        self.lock()
            .documents
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn annotation(&self, namespace: &str, name: &str, key: &str) -> Option<String> {
        self.document(namespace, name)
            .and_then(|doc| doc.annotation(key).map(str::to_string))
    }

    /// Overwrite one annotation as another participant would, bumping the version
    pub fn set_annotation(&self, namespace: &str, name: &str, key: &str, value: &str) {
        let mut state = self.lock();
        let version = state.next_version();
        if let Some(doc) = state
            .documents
            .get_mut(&(namespace.to_string(), name.to_string()))
        {
            doc.annotations.insert(key.to_string(), value.to_string());
            doc.resource_version = Some(version);
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded create and patch calls
    pub fn write_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_write()).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Queue an error for the next `get`
    pub fn fail_get(&self, error: StoreError) {
        self.lock().get_failures.push_back(error);
    }

    /// Queue an error for the next `create`
    pub fn fail_create(&self, error: StoreError) {
        self.lock().create_failures.push_back(error);
    }

    /// Queue an error for the next `patch_annotation`
    pub fn fail_patch(&self, error: StoreError) {
        self.lock().patch_failures.push_back(error);
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Document, StoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Get {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        if let Some(error) = state.get_failures.pop_front() {
            return Err(error);
        }
        state
            .documents
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("configmaps \"{}\" not found", name)))
    }

    async fn create(&self, namespace: &str, document: &Document) -> Result<Document, StoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Create {
            namespace: namespace.to_string(),
            name: document.name.clone(),
        });
        if let Some(error) = state.create_failures.pop_front() {
            return Err(error);
        }
        let key = (namespace.to_string(), document.name.clone());
        if state.documents.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!(
                "configmaps \"{}\" already exists",
                document.name
            )));
        }
        let mut created = document.clone();
        created.namespace = namespace.to_string();
        created.resource_version = Some(state.next_version());
        state.documents.insert(key, created.clone());
        Ok(created)
    }

    async fn patch_annotation(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
        resource_version: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::PatchAnnotation {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            resource_version: resource_version.map(str::to_string),
        });
        if let Some(error) = state.patch_failures.pop_front() {
            return Err(error);
        }
        let version = state.next_version();
        let doc = state
            .documents
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| StoreError::NotFound(format!("configmaps \"{}\" not found", name)))?;
        if let Some(expected) = resource_version {
            if doc.resource_version.as_deref() != Some(expected) {
                return Err(StoreError::Conflict(format!(
                    "the object has been modified: expected version {}",
                    expected
                )));
            }
        }
        doc.annotations.insert(key.to_string(), value.to_string());
        doc.resource_version = Some(version);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
