// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forward process signals to the lock loop

use kubelock_engine::Interrupt;
use tokio::signal::unix::{signal, SignalKind};

/// Trigger `interrupt` on the first SIGINT or SIGTERM.
///
/// Handlers live as long as the runtime; later signals are ignored.
pub fn forward(interrupt: Interrupt) -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        tracing::info!(signal = name, "received signal, stopping");
        interrupt.trigger(name);
    });

    Ok(())
}
