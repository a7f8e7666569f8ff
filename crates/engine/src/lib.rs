// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kube-lock coordination engine

mod coordinator;
mod error;
mod interrupt;

pub use coordinator::{connect, KubeLock, LockCoordinator};
pub use error::LockError;
pub use interrupt::Interrupt;
