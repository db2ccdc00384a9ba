//! End-to-end test utilities for patchbay
//!
//! This crate provides mock back-ends and a harness for exercising the
//! command orchestrator without Cloudflare, SSH, or a database file.

pub mod harness;
pub mod mock_dns;
pub mod mock_remote;

pub use harness::Harness;
pub use mock_dns::MockDnsProvider;
pub use mock_remote::{HostOp, MockProxyHost};
