//! Configuration for building stores.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::store::{MemStore, MemTimedStore};

/// Store configuration.
///
/// ```yaml
/// max_keys: 100000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of keys; `<= 0` means unbounded
    #[serde(default)]
    pub max_keys: i64,
}

impl StoreConfig {
    /// Create a configuration with the given key limit.
    pub fn new(max_keys: i64) -> Self {
        Self { max_keys }
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading store configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| StoreError::Config(format!("Failed to parse store config: {}", e)))
    }

    /// Whether this configuration selects LRU eviction.
    pub fn is_bounded(&self) -> bool {
        self.max_keys > 0
    }

    /// Build an in-process counter store.
    pub fn build(&self) -> Result<MemStore> {
        MemStore::new(self.max_keys)
    }

    /// Build an in-memory timed store on the system clock.
    pub fn build_timed(&self) -> Result<MemTimedStore> {
        MemTimedStore::new(self.max_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CounterStore;

    #[test]
    fn test_parse_max_keys() {
        let config = StoreConfig::from_yaml("max_keys: 500").unwrap();
        assert_eq!(config, StoreConfig::new(500));
        assert!(config.is_bounded());
    }

    #[test]
    fn test_missing_max_keys_defaults_to_unbounded() {
        let config = StoreConfig::from_yaml("{}").unwrap();
        assert_eq!(config.max_keys, 0);
        assert!(!config.is_bounded());
        assert_eq!(config.build().unwrap().capacity(), None);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = StoreConfig::from_yaml("max_keys: lots");
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_build_bounded_store() {
        let store = StoreConfig::new(2).build().unwrap();
        assert_eq!(store.capacity(), Some(2));

        store.set_if_absent("a", 1).unwrap();
        store.set_if_absent("b", 1).unwrap();
        store.set_if_absent("c", 1).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_build_timed_store() {
        let store = StoreConfig::new(-1).build_timed().unwrap();
        assert_eq!(store.capacity(), None);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("ratestore-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "max_keys: 42\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.max_keys, 42);
    }

    #[test]
    fn test_from_missing_file() {
        let result = StoreConfig::from_file("/nonexistent/ratestore.yaml");
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
