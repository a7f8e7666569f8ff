// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore stored in the coordination field of a shared document
//!
//! The semaphore is persisted as a single JSON string:
//! `{"max": 2, "holders": {"web-1": {"date": "...", "reason": "..."}}}`.
//! Holders are kept in a `BTreeMap` so that encoding is deterministic and an
//! unchanged semaphore always produces the same text.

use crate::clock::Clock;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Document field holding the encoded semaphore
pub const ANNOTATION_KEY: &str = "kube-lock";

/// Errors from encoding or decoding a semaphore
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed semaphore: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("cannot encode semaphore: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A named participant occupying one slot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    /// Acquisition time, see [`crate::clock::HOLDER_DATE_FORMAT`]
    #[serde(default)]
    pub date: String,
    /// Free-text annotation supplied by the holder, may be empty
    #[serde(default)]
    pub reason: String,
}

/// Capacity plus the current holder set
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Semaphore {
    pub max: i64,
    pub holders: BTreeMap<String, Holder>,
}

/// Wire shape: both fields may be absent or null in documents written by
/// other tools, so decoding goes through this before defaults apply.
#[derive(Deserialize)]
struct StoredSemaphore {
    #[serde(default)]
    max: Option<i64>,
    #[serde(default, deserialize_with = "nullable_holders")]
    holders: BTreeMap<String, Holder>,
}

fn nullable_holders<'de, D>(deserializer: D) -> Result<BTreeMap<String, Holder>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Holder>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Semaphore {
    /// Empty semaphore with the given capacity
    pub fn new(max: i64) -> Self {
        Self {
            max,
            holders: BTreeMap::new(),
        }
    }

    /// Decode the coordination field.
    ///
    /// `fallback_max` is only used when the stored text carries no `max`;
    /// a stored capacity always wins over the caller's configuration.
    pub fn decode(text: &str, fallback_max: i64) -> Result<Self, CodecError> {
        let stored: StoredSemaphore = serde_json::from_str(text).map_err(CodecError::Decode)?;
        Ok(Self {
            max: stored.max.unwrap_or(fallback_max),
            holders: stored.holders,
        })
    }

    /// Encode for storage in the coordination field
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }

    /// Insert or replace the entry for `name`, stamped with the clock's time
    pub fn set_holder(
        &mut self,
        name: impl Into<String>,
        reason: impl Into<String>,
        clock: &impl Clock,
    ) {
        self.holders.insert(
            name.into(),
            Holder {
                date: clock.holder_date(),
                reason: reason.into(),
            },
        );
    }

    pub fn get_holder(&self, name: &str) -> Option<&Holder> {
        self.holders.get(name)
    }

    /// Remove the entry for `name`, returning it if it was present
    pub fn remove_holder(&mut self, name: &str) -> Option<Holder> {
        self.holders.remove(name)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// Whether one more holder can be admitted without exceeding `max`
    pub fn has_capacity(&self) -> bool {
        i64::try_from(self.holders.len()).is_ok_and(|len| len < self.max)
    }
}

#[cfg(test)]
#[path = "semaphore_tests.rs"]
mod tests;
