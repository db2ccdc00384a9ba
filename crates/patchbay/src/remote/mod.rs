//! Remote proxy-host configuration
//!
//! Proxy hosts are reached over SSH; each operation runs one remote
//! command in its own session (no pooling or reuse). The
//! `ProxyHostAccess` trait is the seam the orchestrator works against,
//! with the SSH implementation in production and a mock in tests.

pub mod caddy;
mod ssh;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::catalog::Location;

pub use ssh::SshProxyHost;

/// Errors from remote operations
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to execute ssh: {0}")]
    Spawn(String),

    #[error("remote command failed on {host} ({status}): {stderr}")]
    CommandFailed {
        host: String,
        status: String,
        stderr: String,
    },
}

/// Host-identity verification policy for SSH connections
///
/// An explicit configuration choice, logged at startup. `AcceptNew`
/// trusts and persists a host's identity on first use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// Refuse hosts not present in known_hosts
    #[default]
    Strict,
    /// Trust-on-first-use: accept and persist unknown host keys
    AcceptNew,
    /// No verification at all (lab use only)
    Off,
}

impl HostKeyPolicy {
    /// Value for OpenSSH's `StrictHostKeyChecking` option
    pub fn ssh_option(self) -> &'static str {
        match self {
            HostKeyPolicy::Strict => "yes",
            HostKeyPolicy::AcceptNew => "accept-new",
            HostKeyPolicy::Off => "no",
        }
    }
}

impl fmt::Display for HostKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostKeyPolicy::Strict => "strict",
            HostKeyPolicy::AcceptNew => "accept-new",
            HostKeyPolicy::Off => "off",
        };
        f.write_str(s)
    }
}

impl FromStr for HostKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(HostKeyPolicy::Strict),
            "accept-new" => Ok(HostKeyPolicy::AcceptNew),
            "off" => Ok(HostKeyPolicy::Off),
            other => Err(format!(
                "invalid host key policy '{}'. Use 'strict', 'accept-new', or 'off'",
                other
            )),
        }
    }
}

/// Trait for configuring a reverse-proxy host
///
/// None of these operations is rolled back by callers; a failure
/// surfaces and aborts the remaining steps of the command that issued
/// it.
#[async_trait]
pub trait ProxyHostAccess: Send + Sync {
    /// Append a site block to the per-hostname config file
    async fn append_config(
        &self,
        location: &Location,
        file_name: &str,
        block: &str,
    ) -> Result<(), RemoteError>;

    /// Delete the per-hostname config file
    async fn remove_config(&self, location: &Location, file_name: &str)
        -> Result<(), RemoteError>;

    /// Restart the reverse-proxy service
    ///
    /// A restart, not a graceful reload: every route hosted on the
    /// machine drops briefly on each change.
    async fn restart_service(&self, location: &Location) -> Result<(), RemoteError>;
}
