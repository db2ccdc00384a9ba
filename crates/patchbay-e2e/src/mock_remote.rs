//! Mock proxy-host access for E2E tests
//!
//! Records every operation against every host so tests can assert on
//! the exact sequence, and keeps the appended config text for content
//! assertions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use patchbay::{Location, ProxyHostAccess, RemoteError};

/// One operation performed against a proxy host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    Append { host: String, file: String },
    Remove { host: String, file: String },
    Restart { host: String },
}

/// Mock proxy host that records operations without opening SSH sessions
pub struct MockProxyHost {
    /// Operations in the order they were issued
    ops: Mutex<Vec<HostOp>>,
    /// "host:file" -> accumulated config text
    configs: DashMap<String, String>,
    /// Number of trait calls made
    calls: AtomicU64,
    fail_append: AtomicBool,
    fail_remove: AtomicBool,
    fail_restart: AtomicBool,
}

impl MockProxyHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ops: Mutex::new(Vec::new()),
            configs: DashMap::new(),
            calls: AtomicU64::new(0),
            fail_append: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
            fail_restart: AtomicBool::new(false),
        })
    }

    fn config_key(host: &str, file: &str) -> String {
        format!("{}:{}", host, file)
    }

    /// Operations issued so far, in order
    pub fn ops(&self) -> Vec<HostOp> {
        self.ops.lock().clone()
    }

    /// The number of trait calls made so far
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Current content of a host's config file, if present
    pub fn config_for(&self, host: &str, file: &str) -> Option<String> {
        self.configs
            .get(&Self::config_key(host, file))
            .map(|c| c.value().clone())
    }

    pub fn set_fail_append(&self, fail: bool) {
        self.fail_append.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_restart(&self, fail: bool) {
        self.fail_restart.store(fail, Ordering::SeqCst);
    }

    fn simulated_failure(host: &str) -> RemoteError {
        RemoteError::CommandFailed {
            host: host.to_string(),
            status: "exit status: 1".to_string(),
            stderr: "simulated failure".to_string(),
        }
    }
}

#[async_trait]
impl ProxyHostAccess for MockProxyHost {
    async fn append_config(
        &self,
        location: &Location,
        file_name: &str,
        block: &str,
    ) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_append.load(Ordering::SeqCst) {
            return Err(Self::simulated_failure(&location.ipv4));
        }

        self.ops.lock().push(HostOp::Append {
            host: location.ipv4.clone(),
            file: file_name.to_string(),
        });
        self.configs
            .entry(Self::config_key(&location.ipv4, file_name))
            .or_default()
            .push_str(block);
        Ok(())
    }

    async fn remove_config(
        &self,
        location: &Location,
        file_name: &str,
    ) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(Self::simulated_failure(&location.ipv4));
        }

        self.ops.lock().push(HostOp::Remove {
            host: location.ipv4.clone(),
            file: file_name.to_string(),
        });
        self.configs
            .remove(&Self::config_key(&location.ipv4, file_name));
        Ok(())
    }

    async fn restart_service(&self, location: &Location) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_restart.load(Ordering::SeqCst) {
            return Err(Self::simulated_failure(&location.ipv4));
        }

        self.ops.lock().push(HostOp::Restart {
            host: location.ipv4.clone(),
        });
        Ok(())
    }
}
