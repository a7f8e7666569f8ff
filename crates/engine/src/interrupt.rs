// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable cancellation for blocking lock acquisition

use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Cancellation source carrying the name of whatever triggered it.
///
/// Clones share state; the first trigger wins and later ones are ignored.
#[derive(Clone, Debug, Default)]
pub struct Interrupt {
    token: CancellationToken,
    signal: Arc<OnceLock<String>>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `signal` (e.g. `"SIGTERM"`) and wake every waiter
    pub fn trigger(&self, signal: impl Into<String>) {
        let _ = self.signal.set(signal.into());
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Name of the triggering signal, once triggered
    pub fn signal(&self) -> Option<&str> {
        self.signal.get().map(String::as_str)
    }

    /// Resolves once [`Interrupt::trigger`] has been called
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
#[path = "interrupt_tests.rs"]
mod tests;
