//! Local record store for provisioned proxies and DNS records
//!
//! Two flat tables keyed by owner identity. The store only answers
//! exact-match queries; it records who created what so that listing and
//! delete authorization work, and nothing else. Writes are single
//! statements — there is no transaction spanning the external
//! provisioning calls and the store mutation.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// A reverse-proxy route created by a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRecord {
    /// Identity of the user who created the route
    pub owner: String,
    /// Location catalog key of the proxy host
    pub location: String,
    /// Subdomain label
    pub hostname: String,
    /// Upstream `ip:port` target
    pub ip_port: String,
}

/// A bare DNS record created by a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsEntry {
    /// Identity of the user who created the record
    pub owner: String,
    /// Subdomain label
    pub hostname: String,
    /// IPv4 target
    pub ip: String,
}

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to create store directory '{path}': {message}")]
    Io { path: String, message: String },
}

/// Thread-safe handle to the SQLite record store
///
/// Statements are short; callers (including async ones) take the
/// connection mutex for the duration of a single statement.
#[derive(Clone)]
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    /// Open (or create) the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.display().to_string(),
                message: e.to_string(),
            })?;
        }

        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize()?;
        tracing::info!("Opened record store at {}", path.as_ref().display());
        Ok(store)
    }

    /// Open an in-memory store (tests)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS proxies (
                owner TEXT NOT NULL,
                location TEXT NOT NULL,
                hostname TEXT NOT NULL,
                ip_port TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS dns_records (
                owner TEXT NOT NULL,
                hostname TEXT NOT NULL,
                ip TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Record a created proxy route
    pub fn insert_proxy(&self, record: &ProxyRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO proxies (owner, location, hostname, ip_port) VALUES (?1, ?2, ?3, ?4)",
            params![record.owner, record.location, record.hostname, record.ip_port],
        )?;
        Ok(())
    }

    /// Find a proxy row by exact (owner, location, hostname) match
    pub fn find_proxy(
        &self,
        owner: &str,
        location: &str,
        hostname: &str,
    ) -> Result<Option<ProxyRecord>, StoreError> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT owner, location, hostname, ip_port FROM proxies
                 WHERE owner = ?1 AND location = ?2 AND hostname = ?3",
                params![owner, location, hostname],
                proxy_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Delete proxy rows by exact (owner, location, hostname) match
    pub fn delete_proxy(
        &self,
        owner: &str,
        location: &str,
        hostname: &str,
    ) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let affected = conn.execute(
            "DELETE FROM proxies WHERE owner = ?1 AND location = ?2 AND hostname = ?3",
            params![owner, location, hostname],
        )?;
        Ok(affected)
    }

    /// All proxy rows belonging to one owner
    pub fn proxies_for(&self, owner: &str) -> Result<Vec<ProxyRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT owner, location, hostname, ip_port FROM proxies WHERE owner = ?1",
        )?;
        let rows = stmt.query_map(params![owner], proxy_from_row)?;
        collect(rows)
    }

    /// Every proxy row, all owners
    pub fn all_proxies(&self) -> Result<Vec<ProxyRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT owner, location, hostname, ip_port FROM proxies")?;
        let rows = stmt.query_map([], proxy_from_row)?;
        collect(rows)
    }

    /// Record a created DNS record
    pub fn insert_dns(&self, entry: &DnsEntry) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO dns_records (owner, hostname, ip) VALUES (?1, ?2, ?3)",
            params![entry.owner, entry.hostname, entry.ip],
        )?;
        Ok(())
    }

    /// Find a DNS row by exact (owner, hostname) match
    pub fn find_dns(&self, owner: &str, hostname: &str) -> Result<Option<DnsEntry>, StoreError> {
        let conn = self.conn.lock();
        let entry = conn
            .query_row(
                "SELECT owner, hostname, ip FROM dns_records
                 WHERE owner = ?1 AND hostname = ?2",
                params![owner, hostname],
                dns_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Delete DNS rows by exact (owner, hostname) match
    pub fn delete_dns(&self, owner: &str, hostname: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let affected = conn.execute(
            "DELETE FROM dns_records WHERE owner = ?1 AND hostname = ?2",
            params![owner, hostname],
        )?;
        Ok(affected)
    }

    /// All DNS rows belonging to one owner
    pub fn dns_for(&self, owner: &str) -> Result<Vec<DnsEntry>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT owner, hostname, ip FROM dns_records WHERE owner = ?1")?;
        let rows = stmt.query_map(params![owner], dns_from_row)?;
        collect(rows)
    }

    /// Every DNS row, all owners
    pub fn all_dns(&self) -> Result<Vec<DnsEntry>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT owner, hostname, ip FROM dns_records")?;
        let rows = stmt.query_map([], dns_from_row)?;
        collect(rows)
    }
}

fn proxy_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProxyRecord> {
    Ok(ProxyRecord {
        owner: row.get(0)?,
        location: row.get(1)?,
        hostname: row.get(2)?,
        ip_port: row.get(3)?,
    })
}

fn dns_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DnsEntry> {
    Ok(DnsEntry {
        owner: row.get(0)?,
        hostname: row.get(1)?,
        ip: row.get(2)?,
    })
}

fn collect<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn proxy(owner: &str, location: &str, hostname: &str) -> ProxyRecord {
        ProxyRecord {
            owner: owner.to_string(),
            location: location.to_string(),
            hostname: hostname.to_string(),
            ip_port: "100.64.0.1:80".to_string(),
        }
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.db");
        let _store = RecordStore::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_insert_and_find_proxy() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_proxy(&proxy("alice", "us-iad", "myservice")).unwrap();

        let found = store.find_proxy("alice", "us-iad", "myservice").unwrap();
        assert_eq!(found, Some(proxy("alice", "us-iad", "myservice")));

        // Exact match only: a different location misses
        assert!(store.find_proxy("alice", "eu-fra", "myservice").unwrap().is_none());
    }

    #[test]
    fn test_delete_proxy_is_exact_match() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_proxy(&proxy("alice", "us-iad", "myservice")).unwrap();
        store.insert_proxy(&proxy("alice", "eu-fra", "myservice")).unwrap();

        let affected = store.delete_proxy("alice", "us-iad", "myservice").unwrap();
        assert_eq!(affected, 1);

        assert!(store.find_proxy("alice", "us-iad", "myservice").unwrap().is_none());
        assert!(store.find_proxy("alice", "eu-fra", "myservice").unwrap().is_some());
    }

    #[test]
    fn test_delete_proxy_other_owner_untouched() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_proxy(&proxy("alice", "us-iad", "myservice")).unwrap();

        let affected = store.delete_proxy("bob", "us-iad", "myservice").unwrap();
        assert_eq!(affected, 0);
        assert!(store.find_proxy("alice", "us-iad", "myservice").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_hostnames_across_locations_allowed() {
        // No uniqueness constraint is enforced by the store
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_proxy(&proxy("alice", "us-iad", "myservice")).unwrap();
        store.insert_proxy(&proxy("bob", "eu-fra", "myservice")).unwrap();

        assert_eq!(store.all_proxies().unwrap().len(), 2);
    }

    #[test]
    fn test_proxies_for_owner_isolation() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert_proxy(&proxy("alice", "us-iad", "a")).unwrap();
        store.insert_proxy(&proxy("bob", "us-iad", "b")).unwrap();

        let alices = store.proxies_for("alice").unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].hostname, "a");

        assert!(store.proxies_for("carol").unwrap().is_empty());
    }

    #[test]
    fn test_dns_roundtrip() {
        let store = RecordStore::open_in_memory().unwrap();
        let entry = DnsEntry {
            owner: "alice".to_string(),
            hostname: "myservice".to_string(),
            ip: "100.64.0.1".to_string(),
        };
        store.insert_dns(&entry).unwrap();

        assert_eq!(store.find_dns("alice", "myservice").unwrap(), Some(entry));
        assert!(store.find_dns("alice", "other").unwrap().is_none());

        assert_eq!(store.delete_dns("alice", "myservice").unwrap(), 1);
        assert!(store.find_dns("alice", "myservice").unwrap().is_none());
        assert!(store.all_dns().unwrap().is_empty());
    }
}
