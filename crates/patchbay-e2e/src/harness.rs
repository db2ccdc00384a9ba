//! Test harness for E2E tests
//!
//! Wires a real orchestrator to the mock DNS provider, the mock proxy
//! host, an in-memory record store, and a fixed two-location catalog.

use std::path::PathBuf;
use std::sync::Arc;

use patchbay::{Location, LocationCatalog, Orchestrator};
use patchbay_store::RecordStore;
use tracing_subscriber::EnvFilter;

use crate::mock_dns::MockDnsProvider;
use crate::mock_remote::MockProxyHost;

/// Managed apex domain used by the harness
pub const DOMAIN: &str = "example.com";
/// Subdomain hostnames are created under
pub const SUBDOMAIN: &str = "apps";
/// IPv4 of the us-iad proxy host
pub const US_IAD_IPV4: &str = "198.51.100.10";
/// IPv6 of the us-iad proxy host
pub const US_IAD_IPV6: &str = "2001:db8:1::10";
/// IPv4 of the eu-fra proxy host
pub const EU_FRA_IPV4: &str = "198.51.100.20";

/// A fully-wired orchestrator over mock back-ends
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub dns: Arc<MockDnsProvider>,
    pub remote: Arc<MockProxyHost>,
    pub store: RecordStore,
}

impl Harness {
    pub fn new() -> Self {
        // Make RUST_LOG work inside tests; repeated init attempts are fine
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();

        let dns = MockDnsProvider::new(DOMAIN);
        let remote = MockProxyHost::new();
        let store = RecordStore::open_in_memory().expect("in-memory store");

        let orchestrator = Orchestrator::new(
            catalog(),
            dns.clone(),
            remote.clone(),
            store.clone(),
            DOMAIN,
            SUBDOMAIN,
        );

        Self {
            orchestrator,
            dns,
            remote,
            store,
        }
    }

    /// The fully-qualified name the harness domain settings produce
    pub fn fqdn(hostname: &str) -> String {
        format!("{}.{}.{}", hostname, SUBDOMAIN, DOMAIN)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

fn catalog() -> LocationCatalog {
    LocationCatalog::from_entries([
        (
            "us-iad".to_string(),
            Location {
                name: "Ashburn, Virginia".to_string(),
                ipv4: US_IAD_IPV4.to_string(),
                ipv6: US_IAD_IPV6.to_string(),
                ssh_key: PathBuf::from("/etc/patchbay/keys/us-iad"),
            },
        ),
        (
            "eu-fra".to_string(),
            Location {
                name: "Frankfurt, Germany".to_string(),
                ipv4: EU_FRA_IPV4.to_string(),
                ipv6: "2001:db8:2::20".to_string(),
                ssh_key: PathBuf::from("/etc/patchbay/keys/eu-fra"),
            },
        ),
    ])
}
