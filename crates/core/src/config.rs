// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock configuration and validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Maximum read-decide-write cycles per lock or unlock call when the
/// document keeps changing underneath us
pub const MAX_CONFLICT_RETRIES: u32 = 5;

/// Errors from validating a [`Config`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for PollingInterval: {0:?}")]
    ZeroPollingInterval(Duration),
    #[error("empty value for HolderName")]
    EmptyHolderName,
    #[error("empty value for ConfigmapName")]
    EmptyDocumentName,
    #[error("empty value for Namespace")]
    EmptyNamespace,
    #[error("invalid value for MaxHolders: {0}, must be > 0")]
    MaxHoldersTooSmall(i64),
}

/// Location of the shared document, rendered as `cm/<name> in ns <namespace>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub namespace: String,
    pub name: String,
}

impl DocumentRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cm/{} in ns {}", self.name, self.namespace)
    }
}

/// Caller-supplied configuration, immutable for the lifetime of a coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Identifies this process's slot
    pub holder_name: String,
    pub max_holders: i64,
    pub namespace: String,
    /// Name of the document (ConfigMap) holding the semaphore
    pub document_name: String,
    #[serde(with = "humantime_serde")]
    pub polling_interval: Duration,
    /// Zero disables the timeout
    #[serde(with = "humantime_serde")]
    pub polling_timeout: Duration,
    pub create_if_missing: bool,
}

impl Config {
    pub fn new(
        namespace: impl Into<String>,
        document_name: impl Into<String>,
        holder_name: impl Into<String>,
    ) -> Self {
        Self {
            holder_name: holder_name.into(),
            max_holders: 1,
            namespace: namespace.into(),
            document_name: document_name.into(),
            polling_interval: Duration::from_secs(30),
            polling_timeout: Duration::from_secs(5 * 60),
            create_if_missing: false,
        }
    }

    pub fn with_max_holders(mut self, max_holders: i64) -> Self {
        self.max_holders = max_holders;
        self
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    pub fn with_polling_timeout(mut self, timeout: Duration) -> Self {
        self.polling_timeout = timeout;
        self
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Check every field, reporting the first violation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling_interval.is_zero() {
            return Err(ConfigError::ZeroPollingInterval(self.polling_interval));
        }
        if self.holder_name.is_empty() {
            return Err(ConfigError::EmptyHolderName);
        }
        if self.document_name.is_empty() {
            return Err(ConfigError::EmptyDocumentName);
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self.max_holders < 1 {
            return Err(ConfigError::MaxHoldersTooSmall(self.max_holders));
        }
        Ok(())
    }

    pub fn document(&self) -> DocumentRef {
        DocumentRef::new(&self.namespace, &self.document_name)
    }

    pub fn has_timeout(&self) -> bool {
        !self.polling_timeout.is_zero()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
