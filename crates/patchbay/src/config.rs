//! Tool configuration with environment variable priority
//!
//! Configuration is resolved in this order (first found wins):
//! 1. Environment variables (PATCHBAY_*)
//! 2. Config file (patchbay.toml)
//! 3. Default values (where applicable)

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::remote::HostKeyPolicy;
use crate::secrets::CredentialSource;

/// Environment variable prefix
const ENV_PREFIX: &str = "PATCHBAY";

/// Tool configuration (parsed from TOML, can be overridden by env)
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Managed apex domain (e.g. "example.com")
    pub domain: Option<String>,

    /// Subdomain under the apex that hostnames are created in
    /// (e.g. "apps" -> myservice.apps.example.com)
    pub subdomain: Option<String>,

    /// Path to the local record store database
    pub store_path: Option<PathBuf>,

    /// Path to the location catalog document
    pub locations_path: Option<PathBuf>,

    /// Cloudflare configuration
    pub cloudflare: Option<CloudflareSettings>,

    /// Remote proxy host configuration
    pub remote: Option<RemoteSettings>,
}

/// Cloudflare API configuration
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CloudflareSettings {
    /// API token with DNS edit permissions (literal, env://, or file://)
    pub api_token: Option<String>,

    /// Zone ID for the managed domain
    pub zone_id: Option<String>,
}

/// Remote proxy host configuration
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RemoteSettings {
    /// SSH user on the proxy hosts
    pub user: Option<String>,

    /// Directory holding per-hostname config files
    pub config_dir: Option<PathBuf>,

    /// Reverse-proxy service name (systemd unit)
    pub service: Option<String>,

    /// Host-identity verification policy: strict, accept-new, or off
    pub host_key_policy: Option<HostKeyPolicy>,
}

/// Resolved configuration with actual secret values
#[derive(Debug)]
pub struct ResolvedSettings {
    pub domain: String,
    pub subdomain: String,
    pub store_path: PathBuf,
    pub locations_path: PathBuf,
    pub cloudflare: ResolvedCloudflareSettings,
    pub remote: ResolvedRemoteSettings,
}

#[derive(Debug)]
pub struct ResolvedCloudflareSettings {
    pub api_token: String,
    pub zone_id: String,
}

#[derive(Debug)]
pub struct ResolvedRemoteSettings {
    pub user: String,
    pub config_dir: PathBuf,
    pub service: String,
    pub host_key_policy: HostKeyPolicy,
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{}_{}", ENV_PREFIX, name)).ok()
}

impl Settings {
    /// Load configuration from a TOML file (optional)
    pub fn load(path: &str) -> Self {
        if Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(settings) => {
                        tracing::info!("Loaded config from {}", path);
                        return settings;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path, e);
                }
            }
        }
        Self::default()
    }

    /// Resolve configuration from environment variables first, then
    /// config file, resolving credential references
    pub fn resolve(self) -> anyhow::Result<ResolvedSettings> {
        // Domain: ENV > config > required
        let domain = get_env("DOMAIN").or(self.domain).ok_or_else(|| {
            anyhow::anyhow!("Domain required. Set PATCHBAY_DOMAIN or domain in config")
        })?;

        // Subdomain: ENV > config > required
        let subdomain = get_env("SUBDOMAIN").or(self.subdomain).ok_or_else(|| {
            anyhow::anyhow!("Subdomain required. Set PATCHBAY_SUBDOMAIN or subdomain in config")
        })?;

        // Store path: ENV > config > default
        let store_path = get_env("STORE_PATH")
            .map(PathBuf::from)
            .or(self.store_path)
            .unwrap_or_else(|| PathBuf::from("patchbay.db"));

        // Catalog path: ENV > config > default
        let locations_path = get_env("LOCATIONS")
            .map(PathBuf::from)
            .or(self.locations_path)
            .unwrap_or_else(|| PathBuf::from("locations.toml"));

        // Cloudflare API token: ENV > config > required
        let cloudflare = self.cloudflare.unwrap_or_default();
        let api_token_source = get_env("CLOUDFLARE_API_TOKEN")
            .or(cloudflare.api_token)
            .ok_or_else(|| anyhow::anyhow!(
                "Cloudflare API token required. Set PATCHBAY_CLOUDFLARE_API_TOKEN or cloudflare.api_token in config"
            ))?;

        // Cloudflare zone ID: ENV > config > required
        let zone_id = get_env("CLOUDFLARE_ZONE_ID")
            .or(cloudflare.zone_id)
            .ok_or_else(|| anyhow::anyhow!(
                "Cloudflare zone ID required. Set PATCHBAY_CLOUDFLARE_ZONE_ID or cloudflare.zone_id in config"
            ))?;

        // Remote settings: ENV > config > defaults
        let remote = self.remote.unwrap_or_default();
        let user = get_env("REMOTE_USER")
            .or(remote.user)
            .unwrap_or_else(|| "root".to_string());
        let config_dir = get_env("REMOTE_CONFIG_DIR")
            .map(PathBuf::from)
            .or(remote.config_dir)
            .unwrap_or_else(|| PathBuf::from("/etc/caddy"));
        let service = get_env("REMOTE_SERVICE")
            .or(remote.service)
            .unwrap_or_else(|| "caddy".to_string());

        let host_key_policy = match get_env("HOST_KEY_POLICY") {
            Some(value) => HostKeyPolicy::from_str(&value)
                .map_err(|e| anyhow::anyhow!("PATCHBAY_HOST_KEY_POLICY: {}", e))?,
            None => remote.host_key_policy.unwrap_or_default(),
        };

        // Resolve the API token credential reference
        let token_source: CredentialSource = api_token_source
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid Cloudflare API token source: {}", e))?;
        let api_token = token_source
            .resolve_trimmed()
            .map_err(|e| anyhow::anyhow!("Failed to resolve Cloudflare API token: {}", e))?;

        Ok(ResolvedSettings {
            domain,
            subdomain,
            store_path,
            locations_path,
            cloudflare: ResolvedCloudflareSettings { api_token, zone_id },
            remote: ResolvedRemoteSettings {
                user,
                config_dir,
                service,
                host_key_policy,
            },
        })
    }

    /// Load config file and resolve with environment variable overrides
    pub fn load_and_resolve(path: &str) -> anyhow::Result<ResolvedSettings> {
        let settings = Self::load(path);
        settings.resolve()
    }
}
