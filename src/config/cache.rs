//! LRU cache configuration.

use super::{parse_env_bool, parse_env_var, Config};
use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum number of entries
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default backlog of undispatched eviction notices before a warning is logged
pub const DEFAULT_NOTIFIER_BACKLOG: usize = 4096;

/// Default name of the notifier worker thread
pub const DEFAULT_NOTIFIER_THREAD: &str = "evicache-notifier";

/// Configuration for [`LruCache`](crate::cache::LruCache)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LruCacheConfig {
    /// Maximum number of entries in the cache
    pub capacity: usize,

    /// Reserve index storage for `capacity` entries up front and on growth
    pub presize_index: bool,

    /// Backlog of undispatched eviction notices above which a warning is logged
    pub notifier_backlog_warning: usize,

    /// Name given to the notifier worker thread
    pub notifier_thread_name: String,

    /// Collect hit/miss/eviction counters
    pub enable_statistics: bool,
}

impl Default for LruCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            presize_index: true,
            notifier_backlog_warning: DEFAULT_NOTIFIER_BACKLOG,
            notifier_thread_name: DEFAULT_NOTIFIER_THREAD.to_string(),
            enable_statistics: true,
        }
    }
}

impl LruCacheConfig {
    /// Default configuration with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }
}

impl Config for LruCacheConfig {
    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::configuration("capacity must be greater than 0"));
        }
        if self.notifier_backlog_warning == 0 {
            return Err(CacheError::configuration(
                "notifier_backlog_warning must be greater than 0",
            ));
        }
        if self.notifier_thread_name.trim().is_empty() {
            return Err(CacheError::configuration("notifier_thread_name must not be empty"));
        }
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.capacity = parse_env_var(&format!("{}CACHE_CAPACITY", prefix), config.capacity);
        config.presize_index =
            parse_env_bool(&format!("{}CACHE_PRESIZE", prefix), config.presize_index);
        config.notifier_backlog_warning =
            parse_env_var(&format!("{}NOTIFIER_BACKLOG", prefix), config.notifier_backlog_warning);
        config.notifier_thread_name =
            parse_env_var(&format!("{}NOTIFIER_THREAD", prefix), config.notifier_thread_name);
        config.enable_statistics =
            parse_env_bool(&format!("{}CACHE_STATISTICS", prefix), config.enable_statistics);
        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            capacity: 65536,
            presize_index: true,
            notifier_backlog_warning: 16384,
            enable_statistics: false,
            ..Default::default()
        }
    }

    fn memory_preset() -> Self {
        Self {
            capacity: 256,
            presize_index: false,
            notifier_backlog_warning: 256,
            enable_statistics: false,
            ..Default::default()
        }
    }

    fn realtime_preset() -> Self {
        Self {
            capacity: 4096,
            presize_index: true,
            notifier_backlog_warning: 8192,
            enable_statistics: true,
            ..Default::default()
        }
    }

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self).map_err(|e| {
            CacheError::configuration(format!("Failed to serialize cache config: {}", e))
        })?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            CacheError::configuration(format!("Failed to parse cache config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LruCacheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(LruCacheConfig::performance_preset().validate().is_ok());
        assert!(LruCacheConfig::memory_preset().validate().is_ok());
        assert!(LruCacheConfig::realtime_preset().validate().is_ok());
        assert_eq!(LruCacheConfig::balanced_preset(), LruCacheConfig::default());
    }

    #[test]
    fn test_validation_failures() {
        let zero = LruCacheConfig::with_capacity(0);
        assert!(matches!(zero.validate(), Err(CacheError::Configuration { .. })));

        let no_backlog = LruCacheConfig {
            notifier_backlog_warning: 0,
            ..Default::default()
        };
        assert!(no_backlog.validate().is_err());

        let unnamed = LruCacheConfig {
            notifier_thread_name: "  ".to_string(),
            ..Default::default()
        };
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_from_env_with_prefix() {
        std::env::set_var("EVTEST1_CACHE_CAPACITY", "77");
        std::env::set_var("EVTEST1_CACHE_PRESIZE", "false");
        std::env::set_var("EVTEST1_NOTIFIER_THREAD", "evict-worker");

        let config = LruCacheConfig::from_env_with_prefix("EVTEST1_").unwrap();
        assert_eq!(config.capacity, 77);
        assert!(!config.presize_index);
        assert_eq!(config.notifier_thread_name, "evict-worker");
        assert_eq!(config.notifier_backlog_warning, DEFAULT_NOTIFIER_BACKLOG);

        std::env::remove_var("EVTEST1_CACHE_CAPACITY");
        std::env::remove_var("EVTEST1_CACHE_PRESIZE");
        std::env::remove_var("EVTEST1_NOTIFIER_THREAD");
    }

    #[test]
    fn test_from_env_rejects_zero_capacity() {
        std::env::set_var("EVTEST2_CACHE_CAPACITY", "0");
        assert!(LruCacheConfig::from_env_with_prefix("EVTEST2_").is_err());
        std::env::remove_var("EVTEST2_CACHE_CAPACITY");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let config = LruCacheConfig {
            capacity: 12,
            enable_statistics: false,
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = LruCacheConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "capacity": 3 }"#).unwrap();

        let loaded = LruCacheConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.capacity, 3);
        assert_eq!(loaded.notifier_thread_name, DEFAULT_NOTIFIER_THREAD);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            LruCacheConfig::load_from_file(&path),
            Err(CacheError::Configuration { .. })
        ));

        let missing = dir.path().join("missing.json");
        assert!(matches!(LruCacheConfig::load_from_file(&missing), Err(CacheError::Io(_))));
    }
}
