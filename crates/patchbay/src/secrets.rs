//! Credential references for secret-bearing settings
//!
//! Settings that hold secrets (the Cloudflare API token) accept a
//! reference instead of the literal value:
//!
//! - `env://VAR_NAME` - read from the process environment
//! - `file:///path/to/file` (or a bare path) - read file content
//! - Plain string - literal value

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors that can occur during credential resolution
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Invalid credential reference '{reference}': {reason}")]
    InvalidRef { reference: String, reason: String },

    #[error("Environment variable '{var}' not set")]
    EnvNotSet { var: String },

    #[error("Failed to read file '{path}': {message}")]
    FileError { path: PathBuf, message: String },
}

/// A reference to a secret value, resolved at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Literal value (no URI scheme)
    Plain(String),

    /// Environment variable: `env://VAR_NAME`
    Env { var: String },

    /// File path: `file:///path/to/file` or a bare path
    File { path: PathBuf },
}

impl CredentialSource {
    /// Backend name for logging
    pub fn backend_name(&self) -> &'static str {
        match self {
            CredentialSource::Plain(_) => "plain",
            CredentialSource::Env { .. } => "env",
            CredentialSource::File { .. } => "file",
        }
    }

    /// Resolve the reference to its actual value
    pub fn resolve(&self) -> Result<String, SecretError> {
        tracing::debug!(backend = self.backend_name(), "Resolving credential");

        match self {
            CredentialSource::Plain(value) => Ok(value.clone()),
            CredentialSource::Env { var } => {
                std::env::var(var).map_err(|_| SecretError::EnvNotSet { var: var.clone() })
            }
            CredentialSource::File { path } => {
                std::fs::read_to_string(path).map_err(|e| SecretError::FileError {
                    path: path.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Resolve the reference, trimming surrounding whitespace
    pub fn resolve_trimmed(&self) -> Result<String, SecretError> {
        self.resolve().map(|s| s.trim().to_string())
    }
}

impl FromStr for CredentialSource {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(var) = s.strip_prefix("env://") {
            if var.is_empty() {
                return Err(SecretError::InvalidRef {
                    reference: s.to_string(),
                    reason: "env reference must specify a variable name".to_string(),
                });
            }
            Ok(CredentialSource::Env {
                var: var.to_string(),
            })
        } else if let Some(path) = s.strip_prefix("file://") {
            if path.is_empty() {
                return Err(SecretError::InvalidRef {
                    reference: s.to_string(),
                    reason: "file reference must specify a path".to_string(),
                });
            }
            Ok(CredentialSource::File {
                path: PathBuf::from(path),
            })
        } else if looks_like_file_path(s) {
            // Bare paths are treated as file references for convenience
            Ok(CredentialSource::File {
                path: PathBuf::from(s),
            })
        } else {
            Ok(CredentialSource::Plain(s.to_string()))
        }
    }
}

/// Check if a string looks like a file path
fn looks_like_file_path(s: &str) -> bool {
    s.starts_with('/') || s.starts_with("./") || s.starts_with("../")
}

impl<'de> Deserialize<'de> for CredentialSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CredentialSource::from_str(&s).map_err(serde::de::Error::custom)
    }
}
