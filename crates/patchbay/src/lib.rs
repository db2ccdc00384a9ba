//! Patchbay provisioning library
//!
//! This library provides the pieces behind the `patchbay` command tool:
//! input validation, the location catalog, the Cloudflare DNS client,
//! remote proxy-host configuration over SSH, and the orchestrator that
//! sequences them per command. The binary in this crate is a console
//! front-end; a chat adapter embeds the same orchestrator and forwards
//! a command name plus positional arguments the same way.

mod catalog;
mod commands;
mod config;
mod dns;
mod remote;
mod secrets;
pub mod validate;

// Re-export public types
pub use catalog::{CatalogError, Location, LocationCatalog};
pub use commands::{Command, CommandError, Orchestrator, Reply, ReplyField};
pub use config::{ResolvedSettings, Settings};
pub use dns::{CloudflareClient, DnsError, DnsProvider, RecordType, ZoneRecord};
pub use remote::{HostKeyPolicy, ProxyHostAccess, RemoteError, SshProxyHost};
pub use secrets::{CredentialSource, SecretError};
