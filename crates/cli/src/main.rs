// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kube-lock: take a slot of a semaphore stored in a ConfigMap

mod args;
mod error;
mod logging;
mod signals;

use args::{Cli, Mode};
use clap::Parser;
use error::{CliError, Exit};
use kubelock_engine::Interrupt;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::setup(cli.verbose);

    match run(cli).await {
        Ok(exit) => exit.into(),
        Err(err) => {
            eprint!("{}", err);
            err.exit.into()
        }
    }
}

async fn run(cli: Cli) -> Result<Exit, CliError> {
    let holder = cli.holder_name()?;
    let lock = kubelock_engine::connect(cli.connection(), cli.config(holder))?;

    match cli.mode() {
        Mode::Unlock => {
            lock.unlock().await?;
            Ok(Exit::Success)
        }
        Mode::RunOnce => {
            if lock.lock_once(&cli.reason).await? {
                Ok(Exit::Success)
            } else {
                tracing::info!(
                    document = %lock.config().document(),
                    "semaphore is full, not waiting"
                );
                Ok(Exit::Full)
            }
        }
        Mode::Lock => {
            let interrupt = Interrupt::new();
            signals::forward(interrupt.clone()).map_err(|e| {
                CliError::new("Cannot install signal handlers").with_source(e)
            })?;
            lock.lock(&cli.reason, &interrupt).await?;
            Ok(Exit::Success)
        }
    }
}
