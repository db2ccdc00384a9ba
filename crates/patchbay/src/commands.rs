//! Command orchestration
//!
//! Each command is a straight-line sequence: validate input, call the
//! DNS provider, optionally configure the remote proxy host, then write
//! the local record. There is no rollback on partial failure and no
//! retry; a failing external call aborts the remaining steps of that
//! command and leaves earlier effects in place.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use patchbay_store::{DnsEntry, ProxyRecord, RecordStore, StoreError};

use crate::catalog::LocationCatalog;
use crate::dns::{DnsError, DnsProvider, RecordType};
use crate::remote::{caddy, ProxyHostAccess, RemoteError};
use crate::validate;

/// A provisioning command, as forwarded by a front-end: a command name
/// plus positional string arguments. The owner identity comes from the
/// front-end (chat platform user, `--owner` on the console).
#[derive(Debug, Clone)]
pub enum Command {
    /// List proxy server locations
    Locations,
    /// Create DNS records and a reverse-proxy route
    CreateProxy {
        owner: String,
        location: String,
        hostname: String,
        ip_port: String,
    },
    /// Create a bare DNS record
    CreateDns {
        owner: String,
        hostname: String,
        ip: String,
    },
    /// List records created by one user
    ListOwn { owner: String },
    /// List records created by all users
    ListAll,
    /// Delete a reverse-proxy route and its DNS records
    DeleteProxy {
        owner: String,
        location: String,
        hostname: String,
    },
    /// Delete a bare DNS record
    DeleteDns { owner: String, hostname: String },
}

/// A named field in a structured reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyField {
    pub name: String,
    pub value: String,
}

/// Structured reply for the front-end to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub summary: String,
    pub fields: Vec<ReplyField>,
}

impl Reply {
    fn text(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            fields: Vec::new(),
        }
    }

    fn with_fields(summary: impl Into<String>, fields: Vec<ReplyField>) -> Self {
        Self {
            summary: summary.into(),
            fields,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        for field in &self.fields {
            write!(f, "\n{}: {}", field.name, field.value)?;
        }
        Ok(())
    }
}

/// Errors from command dispatch
///
/// `Invalid` and `NotFound` are user-facing rejections produced before
/// any state change; the remaining variants are external-call failures
/// that abort the command mid-sequence.
#[derive(Debug, Error)]
pub enum CommandError {
    /// User input rejected; the message is corrective
    #[error("{0}")]
    Invalid(String),

    /// Nothing matched the request; no state change
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Dns(#[from] DnsError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    /// True for rejections that are replies to the user rather than
    /// failures of the tool
    pub fn is_rejection(&self) -> bool {
        matches!(self, CommandError::Invalid(_) | CommandError::NotFound(_))
    }
}

impl From<validate::ValidateError> for CommandError {
    fn from(e: validate::ValidateError) -> Self {
        CommandError::Invalid(e.to_string())
    }
}

/// Sequences the validator, catalog, DNS provider, proxy-host access,
/// and record store per command
///
/// All resources are acquired once at startup and injected; the
/// orchestrator holds no ambient globals.
pub struct Orchestrator {
    catalog: LocationCatalog,
    dns: Arc<dyn DnsProvider>,
    remote: Arc<dyn ProxyHostAccess>,
    store: RecordStore,
    domain: String,
    subdomain: String,
}

impl Orchestrator {
    pub fn new(
        catalog: LocationCatalog,
        dns: Arc<dyn DnsProvider>,
        remote: Arc<dyn ProxyHostAccess>,
        store: RecordStore,
        domain: &str,
        subdomain: &str,
    ) -> Self {
        Self {
            catalog,
            dns,
            remote,
            store,
            domain: domain.to_string(),
            subdomain: subdomain.to_string(),
        }
    }

    /// Zone-relative record name sent to the DNS provider
    fn record_name(&self, hostname: &str) -> String {
        format!("{}.{}", hostname, self.subdomain)
    }

    /// Fully-qualified name used for matching, file naming, and replies
    fn fqdn(&self, hostname: &str) -> String {
        format!("{}.{}.{}", hostname, self.subdomain, self.domain)
    }

    fn unknown_location(&self) -> CommandError {
        CommandError::NotFound(format!(
            "Invalid proxy location. Available locations:\n{}",
            self.catalog.describe_keys()
        ))
    }

    /// Run one command to completion
    pub async fn dispatch(&self, command: Command) -> Result<Reply, CommandError> {
        match command {
            Command::Locations => Ok(self.locations()),
            Command::CreateProxy {
                owner,
                location,
                hostname,
                ip_port,
            } => self.create_proxy(owner, location, hostname, ip_port).await,
            Command::CreateDns {
                owner,
                hostname,
                ip,
            } => self.create_dns(owner, hostname, ip).await,
            Command::ListOwn { owner } => self.list_own(&owner),
            Command::ListAll => self.list_all(),
            Command::DeleteProxy {
                owner,
                location,
                hostname,
            } => self.delete_proxy(owner, location, hostname).await,
            Command::DeleteDns { owner, hostname } => self.delete_dns(owner, hostname).await,
        }
    }

    fn locations(&self) -> Reply {
        let fields = self
            .catalog
            .entries()
            .map(|(key, location)| ReplyField {
                name: key.clone(),
                value: location.name.clone(),
            })
            .collect();
        Reply::with_fields("Proxy Locations", fields)
    }

    async fn create_proxy(
        &self,
        owner: String,
        location_key: String,
        hostname: String,
        ip_port: String,
    ) -> Result<Reply, CommandError> {
        let location = self
            .catalog
            .get(&location_key)
            .ok_or_else(|| self.unknown_location())?;
        validate::hostname(&hostname)?;
        validate::ip_port(&ip_port)?;

        tracing::info!(
            owner = %owner,
            location = %location_key,
            hostname = %hostname,
            upstream = %ip_port,
            "Creating proxy"
        );

        let name = self.record_name(&hostname);
        self.dns
            .create_record(&name, RecordType::A, &location.ipv4)
            .await?;
        self.dns
            .create_record(&name, RecordType::Aaaa, &location.ipv6)
            .await?;

        let fqdn = self.fqdn(&hostname);
        let file_name = caddy::site_file_name(&fqdn);
        let block = caddy::site_block(&fqdn, &ip_port);
        self.remote
            .append_config(location, &file_name, &block)
            .await?;
        self.remote.restart_service(location).await?;

        self.store.insert_proxy(&ProxyRecord {
            owner,
            location: location_key,
            hostname,
            ip_port: ip_port.clone(),
        })?;

        Ok(Reply::text(format!(
            "Proxy for https://{} pointing to `{}` has been created.",
            fqdn, ip_port
        )))
    }

    async fn create_dns(
        &self,
        owner: String,
        hostname: String,
        ip: String,
    ) -> Result<Reply, CommandError> {
        validate::hostname(&hostname)?;
        validate::ipv4(&ip)?;

        tracing::info!(owner = %owner, hostname = %hostname, ip = %ip, "Creating DNS record");

        let name = self.record_name(&hostname);
        self.dns.create_record(&name, RecordType::A, &ip).await?;

        let fqdn = self.fqdn(&hostname);
        self.store.insert_dns(&DnsEntry {
            owner,
            hostname,
            ip: ip.clone(),
        })?;

        Ok(Reply::text(format!(
            "DNS record for `{}` pointing to `{}` has been created.",
            fqdn, ip
        )))
    }

    fn list_own(&self, owner: &str) -> Result<Reply, CommandError> {
        let proxies = self.store.proxies_for(owner)?;
        let dns_entries = self.store.dns_for(owner)?;

        if proxies.is_empty() && dns_entries.is_empty() {
            return Ok(Reply::text("You have no proxies or DNS records."));
        }

        let mut fields = Vec::new();
        for record in &proxies {
            fields.push(ReplyField {
                name: format!(
                    "Proxy: {} ({})",
                    self.fqdn(&record.hostname),
                    record.location
                ),
                value: record.ip_port.clone(),
            });
        }
        for entry in &dns_entries {
            fields.push(ReplyField {
                name: format!("DNS Record: {}", self.fqdn(&entry.hostname)),
                value: entry.ip.clone(),
            });
        }

        Ok(Reply::with_fields("Active Proxies and DNS Records", fields))
    }

    fn list_all(&self) -> Result<Reply, CommandError> {
        let proxies = self.store.all_proxies()?;
        let dns_entries = self.store.all_dns()?;

        if proxies.is_empty() && dns_entries.is_empty() {
            return Ok(Reply::text("No proxies or DNS records found."));
        }

        let mut fields = Vec::new();
        for record in &proxies {
            fields.push(ReplyField {
                name: format!(
                    "User {} - Proxy: {} ({})",
                    record.owner,
                    self.fqdn(&record.hostname),
                    record.location
                ),
                value: record.ip_port.clone(),
            });
        }
        for entry in &dns_entries {
            fields.push(ReplyField {
                name: format!("User {} - DNS Record: {}", entry.owner, self.fqdn(&entry.hostname)),
                value: entry.ip.clone(),
            });
        }

        Ok(Reply::with_fields(
            "All Active Proxies and DNS Records",
            fields,
        ))
    }

    async fn delete_proxy(
        &self,
        owner: String,
        location_key: String,
        hostname: String,
    ) -> Result<Reply, CommandError> {
        // Row check first: an unknown input makes no external calls
        let record = self
            .store
            .find_proxy(&owner, &location_key, &hostname)?
            .ok_or_else(|| CommandError::NotFound("No such proxy found for deletion.".to_string()))?;
        let location = self
            .catalog
            .get(&location_key)
            .ok_or_else(|| self.unknown_location())?;

        tracing::info!(
            owner = %owner,
            location = %location_key,
            hostname = %hostname,
            "Deleting proxy"
        );

        let fqdn = self.fqdn(&hostname);
        let zone_records = self.dns.list_records().await?;
        for record_type in [RecordType::A, RecordType::Aaaa] {
            for matching in zone_records
                .iter()
                .filter(|r| r.name == fqdn && r.record_type == record_type.as_str())
            {
                self.dns.delete_record(&matching.id).await?;
            }
        }

        let file_name = caddy::site_file_name(&fqdn);
        self.remote.remove_config(location, &file_name).await?;
        self.remote.restart_service(location).await?;

        self.store.delete_proxy(&owner, &location_key, &hostname)?;

        Ok(Reply::text(format!(
            "Proxy for `{}` pointing to `{}` has been deleted.",
            fqdn, record.ip_port
        )))
    }

    async fn delete_dns(&self, owner: String, hostname: String) -> Result<Reply, CommandError> {
        validate::hostname(&hostname)?;

        // Row check before any external call
        self.store
            .find_dns(&owner, &hostname)?
            .ok_or_else(|| {
                CommandError::NotFound("No such DNS record found for deletion.".to_string())
            })?;

        tracing::info!(owner = %owner, hostname = %hostname, "Deleting DNS record");

        // Only records matching both exact name and type A are removed
        let fqdn = self.fqdn(&hostname);
        let zone_records = self.dns.list_records().await?;
        for matching in zone_records
            .iter()
            .filter(|r| r.name == fqdn && r.record_type == RecordType::A.as_str())
        {
            self.dns.delete_record(&matching.id).await?;
        }

        self.store.delete_dns(&owner, &hostname)?;

        Ok(Reply::text(format!(
            "DNS record for `{}` has been deleted.",
            fqdn
        )))
    }
}
