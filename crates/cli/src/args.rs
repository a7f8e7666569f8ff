// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command line arguments

use crate::error::CliError;
use clap::{ArgAction, Parser};
use kubelock_adapters::KubeConnection;
use kubelock_core::Config;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "kube-lock",
    version,
    about = "Use this command to take a lock over a configmap",
    after_help = "Example:\n  kube-lock [namespace] [configmap name]"
)]
pub struct Cli {
    /// Namespace of the configmap
    pub namespace: String,

    /// Name of the configmap holding the semaphore
    pub configmap: String,

    /// Kubernetes config path, leave empty for in-cluster config
    // OsString: clap's PathBuf parser rejects the empty value
    #[arg(long, env = "KUBE_LOCK_KUBECONFIG_PATH")]
    pub kubeconfig_path: Option<OsString>,

    /// kubectl binary used to reach the cluster
    #[arg(long, env = "KUBE_LOCK_KUBECTL", default_value = "kubectl")]
    pub kubectl: PathBuf,

    /// Holder name, leave empty to use the hostname
    #[arg(long, env = "KUBE_LOCK_HOLDER_NAME")]
    pub holder_name: Option<String>,

    /// Reason recorded alongside the holder
    #[arg(long, env = "KUBE_LOCK_REASON", default_value = "")]
    pub reason: String,

    /// Max number of holders, must be > 0
    #[arg(
        long,
        env = "KUBE_LOCK_MAX_HOLDERS",
        default_value_t = 1,
        allow_negative_numbers = true
    )]
    pub max_holders: i64,

    /// Create the configmap if not found
    #[arg(long, env = "KUBE_LOCK_CREATE_CONFIGMAP")]
    pub create_configmap: bool,

    /// Interval between each lock attempt
    #[arg(
        long,
        env = "KUBE_LOCK_POLLING_INTERVAL",
        default_value = "30s",
        value_parser = humantime::parse_duration
    )]
    pub polling_interval: Duration,

    /// Timeout threshold for polling, 0s waits forever
    #[arg(
        long,
        env = "KUBE_LOCK_POLLING_TIMEOUT",
        default_value = "5m",
        value_parser = humantime::parse_duration
    )]
    pub polling_timeout: Duration,

    /// Try to lock once, exit 3 if the semaphore is full
    #[arg(long, env = "KUBE_LOCK_RUN_ONCE", conflicts_with = "unlock")]
    pub run_once: bool,

    /// Unlock the semaphore
    #[arg(long, env = "KUBE_LOCK_UNLOCK")]
    pub unlock: bool,

    /// Verbose level, repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Which protocol entry point to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Lock,
    RunOnce,
    Unlock,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.unlock {
            Mode::Unlock
        } else if self.run_once {
            Mode::RunOnce
        } else {
            Mode::Lock
        }
    }

    /// Explicit holder name, falling back to the host name
    pub fn holder_name(&self) -> Result<String, CliError> {
        match self.holder_name.as_deref() {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => hostname::get()
                .map_err(|e| {
                    CliError::config("Cannot determine the host name")
                        .with_suggestion("Pass --holder-name explicitly")
                        .with_source(e)
                })?
                .into_string()
                .map_err(|raw| {
                    CliError::config(format!("Host name {:?} is not valid UTF-8", raw))
                        .with_suggestion("Pass --holder-name explicitly")
                }),
        }
    }

    pub fn config(&self, holder_name: String) -> Config {
        Config::new(&self.namespace, &self.configmap, holder_name)
            .with_max_holders(self.max_holders)
            .with_polling_interval(self.polling_interval)
            .with_polling_timeout(self.polling_timeout)
            .with_create_if_missing(self.create_configmap)
    }

    pub fn connection(&self) -> KubeConnection {
        let kubeconfig = self
            .kubeconfig_path
            .clone()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        KubeConnection::default()
            .with_kubectl(&self.kubectl)
            .with_kubeconfig(kubeconfig)
    }
}
