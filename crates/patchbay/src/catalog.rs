//! Location catalog
//!
//! A static document mapping a short location key to the proxy host it
//! names. Loaded once at startup and immutable thereafter.
//!
//! ```toml
//! [locations.us-iad]
//! name = "Ashburn, Virginia"
//! ipv4 = "198.51.100.10"
//! ipv6 = "2001:db8:1::10"
//! ssh_key = "/etc/patchbay/keys/us-iad"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// A proxy host location
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// Human-readable display name
    pub name: String,
    /// IPv4 address of the proxy host (also the SSH target)
    pub ipv4: String,
    /// IPv6 address of the proxy host
    pub ipv6: String,
    /// Path to the private key used to reach the host
    pub ssh_key: PathBuf,
}

/// Errors loading the catalog document
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog '{path}': {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse catalog '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

/// Immutable key -> location mapping
///
/// A `BTreeMap` keeps enumeration order stable, so rejection messages
/// and the locations listing always read the same way.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationCatalog {
    #[serde(default)]
    locations: BTreeMap<String, Location>,
}

impl LocationCatalog {
    /// Load the catalog document from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let catalog: Self = toml::from_str(&content).map_err(|e| CatalogError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::info!(
            locations = catalog.locations.len(),
            "Loaded location catalog from {}",
            path.display()
        );
        Ok(catalog)
    }

    /// Build a catalog directly from entries (tests, embedding)
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Location)>,
    {
        Self {
            locations: entries.into_iter().collect(),
        }
    }

    /// Look up a location by key
    pub fn get(&self, key: &str) -> Option<&Location> {
        self.locations.get(key)
    }

    /// Iterate over (key, location) pairs in stable order
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Location)> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// One `key - display name` line per location, used in the
    /// unknown-location rejection message
    pub fn describe_keys(&self) -> String {
        self.locations
            .iter()
            .map(|(key, location)| format!("{} - {}", key, location.name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> LocationCatalog {
        LocationCatalog::from_entries([
            (
                "us-iad".to_string(),
                Location {
                    name: "Ashburn, Virginia".to_string(),
                    ipv4: "198.51.100.10".to_string(),
                    ipv6: "2001:db8:1::10".to_string(),
                    ssh_key: PathBuf::from("/etc/patchbay/keys/us-iad"),
                },
            ),
            (
                "eu-fra".to_string(),
                Location {
                    name: "Frankfurt, Germany".to_string(),
                    ipv4: "198.51.100.20".to_string(),
                    ipv6: "2001:db8:2::20".to_string(),
                    ssh_key: PathBuf::from("/etc/patchbay/keys/eu-fra"),
                },
            ),
        ])
    }

    #[test]
    fn test_lookup() {
        let catalog = sample();
        assert_eq!(catalog.get("us-iad").unwrap().ipv4, "198.51.100.10");
        assert!(catalog.get("ap-syd").is_none());
    }

    #[test]
    fn test_describe_keys_is_stable() {
        let catalog = sample();
        assert_eq!(
            catalog.describe_keys(),
            "eu-fra - Frankfurt, Germany\nus-iad - Ashburn, Virginia"
        );
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[locations.us-iad]
name = "Ashburn, Virginia"
ipv4 = "198.51.100.10"
ipv6 = "2001:db8:1::10"
ssh_key = "/etc/patchbay/keys/us-iad"
"#
        )
        .unwrap();

        let catalog = LocationCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("us-iad").unwrap().name, "Ashburn, Virginia");
    }

    #[test]
    fn test_load_missing_file() {
        let result = LocationCatalog::load("/definitely/not/a/real/catalog.toml");
        assert!(matches!(result, Err(CatalogError::Read { .. })));
    }

    #[test]
    fn test_load_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[locations.us-iad]\nname = 3").unwrap();

        let result = LocationCatalog::load(file.path());
        assert!(matches!(result, Err(CatalogError::Parse { .. })));
    }
}
