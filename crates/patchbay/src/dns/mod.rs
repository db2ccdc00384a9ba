//! DNS record management
//!
//! The `DnsProvider` trait allows for different DNS backends
//! (Cloudflare in production, a mock for testing).

mod cloudflare;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use cloudflare::CloudflareClient;

/// Record types this tool creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Aaaa,
}

impl RecordType {
    /// Provider wire name
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as reported by the provider's list operation
///
/// `record_type` stays a string: the zone also holds types this tool
/// never creates, and exact-match filtering is all callers do with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRecord {
    /// Provider record id, used for deletion
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Provider type string ("A", "AAAA", "CNAME", ...)
    pub record_type: String,
    /// Record content (address)
    pub content: String,
}

/// Errors from DNS provider operations
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("API error: {0}")]
    Api(String),
}

/// Trait for DNS management providers
///
/// Creation is fire-and-forget: no implementation verifies the record
/// became active. Deleting records for a hostname is done by the caller
/// listing the zone and filtering client-side by exact name and type —
/// an O(zone) scan that is acceptable because zones are assumed small.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Create a record in the zone
    ///
    /// `name` may be zone-relative (e.g. "myservice.apps"); the
    /// provider qualifies it against the zone domain.
    ///
    /// # Returns
    /// The provider record id.
    async fn create_record(
        &self,
        name: &str,
        record_type: RecordType,
        content: &str,
    ) -> Result<String, DnsError>;

    /// List every record in the zone
    async fn list_records(&self) -> Result<Vec<ZoneRecord>, DnsError>;

    /// Delete a record by its provider id
    async fn delete_record(&self, record_id: &str) -> Result<(), DnsError>;
}
