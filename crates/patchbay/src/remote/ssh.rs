//! SSH-backed proxy host access
//!
//! Runs the system `ssh` binary with `tokio::process`, one process per
//! operation. Exit status and stderr are captured; a non-zero exit
//! surfaces as `RemoteError::CommandFailed` rather than being ignored.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::catalog::Location;

use super::{HostKeyPolicy, ProxyHostAccess, RemoteError};

/// Configures proxy hosts over SSH
pub struct SshProxyHost {
    user: String,
    config_dir: PathBuf,
    service: String,
    host_key_policy: HostKeyPolicy,
}

impl SshProxyHost {
    pub fn new(
        user: &str,
        config_dir: &Path,
        service: &str,
        host_key_policy: HostKeyPolicy,
    ) -> Self {
        Self {
            user: user.to_string(),
            config_dir: config_dir.to_path_buf(),
            service: service.to_string(),
            host_key_policy,
        }
    }

    fn config_path(&self, file_name: &str) -> String {
        self.config_dir.join(file_name).display().to_string()
    }

    /// Full argument vector for one remote command
    fn ssh_args(&self, location: &Location, command: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            location.ssh_key.display().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("StrictHostKeyChecking={}", self.host_key_policy.ssh_option()),
            format!("{}@{}", self.user, location.ipv4),
            command.to_string(),
        ]
    }

    /// Run one remote command in a fresh session, optionally feeding
    /// `input` to its stdin
    async fn exec(
        &self,
        location: &Location,
        command: &str,
        input: Option<&str>,
    ) -> Result<(), RemoteError> {
        tracing::debug!(host = %location.ipv4, %command, "Running remote command");

        let mut child = Command::new("ssh")
            .args(self.ssh_args(location, command))
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RemoteError::Spawn(e.to_string()))?;

        if let Some(data) = input {
            // Take stdin and drop it after writing so the remote `cat` sees EOF
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| RemoteError::Spawn("child stdin unavailable".to_string()))?;
            stdin
                .write_all(data.as_bytes())
                .await
                .map_err(|e| RemoteError::Spawn(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RemoteError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RemoteError::CommandFailed {
                host: location.ipv4.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ProxyHostAccess for SshProxyHost {
    async fn append_config(
        &self,
        location: &Location,
        file_name: &str,
        block: &str,
    ) -> Result<(), RemoteError> {
        // The block goes over stdin, so its content never needs shell quoting
        let command = format!("cat >> '{}'", self.config_path(file_name));
        self.exec(location, &command, Some(block)).await
    }

    async fn remove_config(
        &self,
        location: &Location,
        file_name: &str,
    ) -> Result<(), RemoteError> {
        let command = format!("rm -f '{}'", self.config_path(file_name));
        self.exec(location, &command, None).await
    }

    async fn restart_service(&self, location: &Location) -> Result<(), RemoteError> {
        let command = format!("systemctl restart {}", self.service);
        self.exec(location, &command, None).await
    }
}
