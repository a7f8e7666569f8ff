// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock coordinator: LockOnce / Lock / UnLock over a shared document
//!
//! Every operation reads the document fresh, decides locally, and writes the
//! whole semaphore back through a single-annotation merge patch. The patch
//! carries the resource version observed at read time, so a concurrent
//! writer makes it fail with a conflict instead of silently losing an
//! update; the read-decide-write cycle is then repeated, up to
//! [`MAX_CONFLICT_RETRIES`] times per call. Stores that expose no version
//! get a blind write.

use crate::error::LockError;
use crate::interrupt::Interrupt;
use kubelock_adapters::{
    Document, DocumentStore, KubeConnection, KubectlStore, StoreError, TracedDocumentStore,
};
use kubelock_core::{
    Clock, Config, DocumentRef, Semaphore, SystemClock, ANNOTATION_KEY, MAX_CONFLICT_RETRIES,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::Instrument;

/// Coordinator backed by kubectl, as used by the binary
pub type KubeLock = LockCoordinator<TracedDocumentStore<KubectlStore>>;

/// Build a kubectl-backed coordinator. No cluster call happens until the
/// first lock or unlock.
pub fn connect(connection: KubeConnection, config: Config) -> Result<KubeLock, LockError> {
    LockCoordinator::new(TracedDocumentStore::new(KubectlStore::new(connection)), config)
}

/// Coordinates one holder's slot in a semaphore shared through a document
pub struct LockCoordinator<S, C = SystemClock> {
    config: Config,
    document: DocumentRef,
    /// Encoded `{max, holders: {}}` used when creating the document
    empty_semaphore: String,
    store: S,
    clock: C,
}

impl<S: DocumentStore> LockCoordinator<S, SystemClock> {
    pub fn new(store: S, config: Config) -> Result<Self, LockError> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: DocumentStore, C: Clock> LockCoordinator<S, C> {
    pub fn with_clock(store: S, config: Config, clock: C) -> Result<Self, LockError> {
        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "cannot use the provided config");
            return Err(e.into());
        }
        let document = config.document();
        tracing::debug!(
            %document,
            create_if_missing = config.create_if_missing,
            "configured lock"
        );

        let empty_semaphore = Semaphore::new(config.max_holders)
            .encode()
            .map_err(|source| LockError::Encode {
                document: document.clone(),
                source,
            })?;

        Ok(Self {
            config,
            document,
            empty_semaphore,
            store,
            clock,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn span(&self, operation: &'static str) -> tracing::Span {
        tracing::info_span!(
            "kube_lock",
            operation,
            namespace = %self.config.namespace,
            document = %self.config.document_name,
            holder = %self.config.holder_name,
        )
    }

    /// Single non-blocking admission attempt.
    ///
    /// `Ok(false)` means the semaphore is full; nothing was written.
    pub async fn lock_once(&self, reason: &str) -> Result<bool, LockError> {
        self.retry_on_conflict(|| self.try_lock_once(reason))
            .instrument(self.span("lock_once"))
            .await
    }

    /// Block until a slot is acquired, the polling timeout elapses, or
    /// `interrupt` is triggered. Store errors abort immediately.
    pub async fn lock(&self, reason: &str, interrupt: &Interrupt) -> Result<(), LockError> {
        self.poll_for_lock(reason, interrupt)
            .instrument(self.span("lock"))
            .await
    }

    /// Release this holder's slot; missing document or holder is a no-op
    pub async fn unlock(&self) -> Result<(), LockError> {
        self.retry_on_conflict(|| self.try_unlock())
            .instrument(self.span("unlock"))
            .await
    }

    async fn try_lock_once(&self, reason: &str) -> Result<bool, LockError> {
        tracing::info!(reason, "processing lock");
        let document = self.fetch_or_create().await?;
        let mut semaphore = self.read_semaphore(&document)?;

        if let Some(existing) = semaphore.get_holder(&self.config.holder_name) {
            tracing::info!(
                since = %existing.date,
                reason = %existing.reason,
                "already locked"
            );
            return Ok(true);
        }

        if !semaphore.has_capacity() {
            tracing::info!(
                holders = semaphore.len(),
                max = semaphore.max,
                "cannot lock, semaphore is full"
            );
            return Ok(false);
        }

        tracing::info!(
            holders = semaphore.len(),
            max = semaphore.max,
            "can lock semaphore"
        );
        semaphore.set_holder(self.config.holder_name.clone(), reason, &self.clock);
        self.write_semaphore(&document, &semaphore).await?;
        tracing::info!("successfully locked");
        Ok(true)
    }

    async fn poll_for_lock(&self, reason: &str, interrupt: &Interrupt) -> Result<(), LockError> {
        let acquired = tokio::select! {
            biased;
            _ = interrupt.cancelled() => return Err(self.cancelled(interrupt)),
            acquired = self.lock_once(reason) => acquired?,
        };
        if acquired {
            return Ok(());
        }

        let interval = self.config.polling_interval;
        let timeout = self.config.polling_timeout;
        tracing::info!(?interval, ?timeout, "starting to poll for lock");

        let start = Instant::now();
        let mut ticker = time::interval_at(start + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let has_timeout = self.config.has_timeout();
        if !has_timeout {
            tracing::info!("no timeout specified");
        }
        let deadline = async move {
            if has_timeout {
                time::sleep_until(start + timeout).await
            } else {
                std::future::pending::<()>().await
            }
        };
        tokio::pin!(deadline);

        loop {
            // Deadline before ticker: a tick landing on the deadline gets no attempt
            tokio::select! {
                biased;
                _ = interrupt.cancelled() => return Err(self.cancelled(interrupt)),
                _ = &mut deadline => return Err(self.timed_out(timeout)),
                _ = ticker.tick() => {}
            }

            // An attempt in flight is dropped on interrupt or deadline,
            // which kills its kubectl child
            let acquired = tokio::select! {
                biased;
                _ = interrupt.cancelled() => return Err(self.cancelled(interrupt)),
                _ = &mut deadline => return Err(self.timed_out(timeout)),
                acquired = self.lock_once(reason) => acquired?,
            };
            if acquired {
                return Ok(());
            }
            tracing::info!("semaphore is full, skipping lock");
        }
    }

    fn cancelled(&self, interrupt: &Interrupt) -> LockError {
        let signal = interrupt.signal().unwrap_or("cancellation").to_string();
        tracing::warn!(%signal, "stopped polling");
        LockError::Cancelled {
            document: self.document.clone(),
            signal,
        }
    }

    fn timed_out(&self, timeout: Duration) -> LockError {
        tracing::warn!(?timeout, "stopped polling");
        LockError::Timeout {
            document: self.document.clone(),
            timeout,
        }
    }

    async fn try_unlock(&self) -> Result<(), LockError> {
        tracing::info!("processing unlock");
        let document = match self
            .store
            .get(&self.config.namespace, &self.config.document_name)
            .await
        {
            Ok(document) => document,
            Err(StoreError::NotFound(_)) => {
                tracing::info!("unlock not needed: document not found");
                return Ok(());
            }
            Err(source) => return Err(self.store_error(source)),
        };

        let mut semaphore = self.read_semaphore(&document)?;
        let Some(removed) = semaphore.remove_holder(&self.config.holder_name) else {
            tracing::info!("unlock not needed: not in semaphore");
            return Ok(());
        };

        tracing::info!(
            since = %removed.date,
            reason = %removed.reason,
            "unlocking current holder"
        );
        self.write_semaphore(&document, &semaphore).await?;
        tracing::info!("successfully unlocked");
        Ok(())
    }

    /// Repeat a read-decide-write cycle while another writer keeps winning
    async fn retry_on_conflict<T, F, Fut>(&self, mut attempt: F) -> Result<T, LockError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LockError>>,
    {
        for n in 1..=MAX_CONFLICT_RETRIES {
            match attempt().await {
                Err(e) if e.is_conflict() => {
                    tracing::warn!(attempt = n, error = %e, "document changed concurrently");
                }
                result => return result,
            }
        }
        Err(LockError::ConflictRetriesExhausted {
            document: self.document.clone(),
            holder: self.config.holder_name.clone(),
            attempts: MAX_CONFLICT_RETRIES,
        })
    }

    async fn fetch_or_create(&self) -> Result<Document, LockError> {
        let namespace = &self.config.namespace;
        let name = &self.config.document_name;

        match self.store.get(namespace, name).await {
            Ok(document) => Ok(document),
            Err(StoreError::NotFound(_)) if self.config.create_if_missing => {
                tracing::info!("creating document");
                let document = Document::new(namespace, name)
                    .with_annotation(ANNOTATION_KEY, self.empty_semaphore.clone());
                self.store
                    .create(namespace, &document)
                    .await
                    .map_err(|source| self.store_error(source))
            }
            Err(StoreError::NotFound(_)) => {
                tracing::error!("document not found and creation is disabled");
                Err(LockError::NotFound {
                    document: self.document.clone(),
                })
            }
            Err(source) => Err(self.store_error(source)),
        }
    }

    fn read_semaphore(&self, document: &Document) -> Result<Semaphore, LockError> {
        match document.annotation(ANNOTATION_KEY) {
            Some(text) => {
                tracing::debug!(semaphore = text, "current semaphore");
                Semaphore::decode(text, self.config.max_holders).map_err(|source| {
                    LockError::Decode {
                        document: self.document.clone(),
                        source,
                    }
                })
            }
            None => {
                tracing::info!("empty semaphore");
                Ok(Semaphore::new(self.config.max_holders))
            }
        }
    }

    async fn write_semaphore(
        &self,
        document: &Document,
        semaphore: &Semaphore,
    ) -> Result<(), LockError> {
        let text = semaphore.encode().map_err(|source| LockError::Encode {
            document: self.document.clone(),
            source,
        })?;
        self.store
            .patch_annotation(
                &self.config.namespace,
                &self.config.document_name,
                ANNOTATION_KEY,
                &text,
                document.resource_version.as_deref(),
            )
            .await
            .map_err(|source| self.store_error(source))
    }

    fn store_error(&self, source: StoreError) -> LockError {
        LockError::Store {
            document: self.document.clone(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
