// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock coordinator errors

use kubelock_adapters::StoreError;
use kubelock_core::{CodecError, ConfigError, DocumentRef};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the lock coordinator.
///
/// Every variant past construction names the document it concerns so the
/// caller can report it without extra context.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("cannot use the provided config: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot get {document}: not found, specify the creation of the configmap or create it before")]
    NotFound { document: DocumentRef },
    #[error("cannot decode semaphore in {document}: {source}")]
    Decode {
        document: DocumentRef,
        #[source]
        source: CodecError,
    },
    #[error("cannot encode semaphore for {document}: {source}")]
    Encode {
        document: DocumentRef,
        #[source]
        source: CodecError,
    },
    #[error("store error on {document}: {source}")]
    Store {
        document: DocumentRef,
        #[source]
        source: StoreError,
    },
    #[error("cannot update {document} for holder {holder}: still conflicting after {attempts} attempts")]
    ConflictRetriesExhausted {
        document: DocumentRef,
        holder: String,
        attempts: u32,
    },
    #[error("cannot lock {document}, timeout after {timeout:?}")]
    Timeout {
        document: DocumentRef,
        timeout: Duration,
    },
    #[error("cannot lock {document}, {signal} received")]
    Cancelled { document: DocumentRef, signal: String },
}

impl LockError {
    /// A concurrent writer got there first; the whole cycle may be retried
    pub(crate) fn is_conflict(&self) -> bool {
        matches!(self, LockError::Store { source, .. } if source.is_conflict())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, LockError::Config(_))
    }
}
