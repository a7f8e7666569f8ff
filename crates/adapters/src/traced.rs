// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::store::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any DocumentStore
#[derive(Clone)]
pub struct TracedDocumentStore<S> {
    inner: S,
}

impl<S> TracedDocumentStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TracedDocumentStore<S> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Document, StoreError> {
        let span = tracing::debug_span!("store.get", namespace, name);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.get(namespace, name).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(doc) => tracing::debug!(
                    elapsed_ms,
                    resource_version = doc.resource_version.as_deref().unwrap_or("-"),
                    "fetched"
                ),
                // Missing documents are an expected outcome for the caller to decide on
                Err(StoreError::NotFound(_)) => tracing::debug!(elapsed_ms, "not found"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "get failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn create(&self, namespace: &str, document: &Document) -> Result<Document, StoreError> {
        let span = tracing::info_span!("store.create", namespace, name = %document.name);
        async {
            tracing::info!(annotations = document.annotations.len(), "creating");

            let start = std::time::Instant::now();
            let result = self.inner.create(namespace, document).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "created"),
                Err(e) if e.is_conflict() => {
                    tracing::warn!(elapsed_ms, error = %e, "lost creation race")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn patch_annotation(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
        resource_version: Option<&str>,
    ) -> Result<(), StoreError> {
        let span = tracing::debug_span!("store.patch", namespace, name, key);
        async {
            tracing::trace!(value, resource_version, "patching");

            let start = std::time::Instant::now();
            let result = self
                .inner
                .patch_annotation(namespace, name, key, value, resource_version)
                .await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "patched"),
                Err(e) if e.is_conflict() => {
                    tracing::warn!(elapsed_ms, error = %e, "version conflict")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "patch failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
