//! Mock DNS provider for E2E tests
//!
//! Tracks zone records in memory without making real API calls. Every
//! trait call increments a counter so tests can assert that a rejected
//! command made no external calls at all.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use patchbay::{DnsError, DnsProvider, RecordType, ZoneRecord};

/// Mock DNS provider backed by an in-memory zone
pub struct MockDnsProvider {
    /// Zone apex; relative names are qualified against it, as the real
    /// provider does
    zone: String,
    /// record_id -> record
    records: DashMap<String, ZoneRecord>,
    /// Counter for generating unique record IDs
    record_counter: AtomicU64,
    /// Number of trait calls made (create, list, and delete all count)
    calls: AtomicU64,
    /// Whether to simulate failures on create
    fail_create: AtomicBool,
    /// Whether to simulate failures on delete
    fail_delete: AtomicBool,
}

impl MockDnsProvider {
    pub fn new(zone: &str) -> Arc<Self> {
        Arc::new(Self {
            zone: zone.to_string(),
            records: DashMap::new(),
            record_counter: AtomicU64::new(1),
            calls: AtomicU64::new(0),
            fail_create: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        })
    }

    fn qualify(&self, name: &str) -> String {
        if name == self.zone || name.ends_with(&format!(".{}", self.zone)) {
            name.to_string()
        } else {
            format!("{}.{}", name, self.zone)
        }
    }

    /// All records currently in the zone (for test assertions)
    pub fn records(&self) -> Vec<ZoneRecord> {
        let mut all: Vec<ZoneRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Records matching a fully-qualified name
    pub fn records_named(&self, name: &str) -> Vec<ZoneRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.name == name)
            .collect()
    }

    /// The number of records in the zone
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// The number of trait calls made so far
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Place a record in the zone directly (does not count as a call)
    pub fn seed_record(&self, name: &str, record_type: &str, content: &str) -> String {
        let record_id = format!(
            "seed-record-{}",
            self.record_counter.fetch_add(1, Ordering::Relaxed)
        );
        self.records.insert(
            record_id.clone(),
            ZoneRecord {
                id: record_id.clone(),
                name: self.qualify(name),
                record_type: record_type.to_string(),
                content: content.to_string(),
            },
        );
        record_id
    }

    /// Configure the mock to fail on create operations
    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Configure the mock to fail on delete operations
    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn create_record(
        &self,
        name: &str,
        record_type: RecordType,
        content: &str,
    ) -> Result<String, DnsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DnsError::Api("Simulated create failure".into()));
        }

        let record_id = format!(
            "mock-record-{}",
            self.record_counter.fetch_add(1, Ordering::Relaxed)
        );
        self.records.insert(
            record_id.clone(),
            ZoneRecord {
                id: record_id.clone(),
                name: self.qualify(name),
                record_type: record_type.as_str().to_string(),
                content: content.to_string(),
            },
        );
        tracing::debug!(
            "MockDnsProvider: created {} record {} for {}",
            record_type,
            record_id,
            name
        );
        Ok(record_id)
    }

    async fn list_records(&self) -> Result<Vec<ZoneRecord>, DnsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records())
    }

    async fn delete_record(&self, record_id: &str) -> Result<(), DnsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(DnsError::Api("Simulated delete failure".into()));
        }

        self.records.remove(record_id);
        tracing::debug!("MockDnsProvider: deleted record {}", record_id);
        Ok(())
    }
}
