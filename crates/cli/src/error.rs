// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing errors with context, suggestions and an exit status.

use kubelock_engine::LockError;
use std::fmt;
use std::process::ExitCode;

/// Process exit statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    /// Invalid configuration
    Config = 1,
    /// Store, protocol, timeout or interruption failure
    Failed = 2,
    /// `--run-once` found the semaphore full
    Full = 3,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub exit: Exit,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
            exit: Exit::Failed,
        }
    }

    /// Error caused by invalid flags or environment
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(message).with_exit(Exit::Config)
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_exit(mut self, exit: Exit) -> Self {
        self.exit = exit;
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<LockError> for CliError {
    fn from(err: LockError) -> Self {
        let base = if err.is_config() {
            CliError::config(err.to_string())
        } else {
            CliError::new(err.to_string())
        };

        let described = match &err {
            LockError::Config(_) => base.with_suggestion("See the accepted flags: kube-lock --help"),
            LockError::NotFound { document } => base
                .with_suggestion("Pass --create-configmap to create it on first lock")
                .with_suggestion(format!(
                    "Create it beforehand: kubectl --namespace {} create configmap {}",
                    document.namespace, document.name
                )),
            LockError::Decode { document, .. } => base
                .with_context("The kube-lock annotation does not hold a valid semaphore")
                .with_suggestion(format!(
                    "Inspect it: kubectl --namespace {} get configmap {} --output yaml",
                    document.namespace, document.name
                )),
            LockError::ConflictRetriesExhausted { .. } => base
                .with_context("Other holders kept updating the configmap concurrently")
                .with_suggestion("Retry the command"),
            LockError::Timeout { document, .. } => base
                .with_context("Every slot stayed taken for the whole polling window")
                .with_suggestion("Raise --polling-timeout, or set it to 0s to wait forever")
                .with_suggestion(format!(
                    "List current holders: kubectl --namespace {} get configmap {} --output yaml",
                    document.namespace, document.name
                )),
            LockError::Store { .. } => base
                .with_suggestion("Check that kubectl can reach the cluster with the same kubeconfig"),
            LockError::Encode { .. } | LockError::Cancelled { .. } => base,
        };

        described.with_source(err)
    }
}
