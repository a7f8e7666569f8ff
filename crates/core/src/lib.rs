// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kubelock-core: data model for the kube-lock distributed semaphore
//!
//! This crate provides:
//! - The semaphore codec stored in the shared document's coordination field
//! - Lock configuration and its validation
//! - A clock abstraction for holder timestamps

pub mod clock;
pub mod config;
pub mod semaphore;

pub use clock::{Clock, FakeClock, SystemClock, HOLDER_DATE_FORMAT};
pub use config::{Config, ConfigError, DocumentRef, MAX_CONFLICT_RETRIES};
pub use semaphore::{CodecError, Holder, Semaphore, ANNOTATION_KEY};
