//! # Evicache: Bounded LRU Cache with Eviction Notifications
//!
//! An in-process, thread-safe key/value cache with a fixed entry budget. When a
//! new key arrives at capacity the least recently used entry is evicted, and
//! callbacks registered for that key are run on a background thread.
//!
//! ## Key Features
//!
//! - **O(1) operations**: insert, update, lookup and removal in constant time
//! - **Recency on read**: a successful lookup refreshes the key
//! - **Shared values**: values are stored as `Arc<V>` and never copied
//! - **Forced-eviction callbacks**: deduplicated per key, run off the caller's thread
//! - **Explicit errors**: every operation returns [`Result`]
//! - **Configuration**: presets, environment variables and JSON files
//!
//! ## Quick Start
//!
//! ```rust
//! use evicache::{EvictionCallback, LruCache};
//! use std::sync::Arc;
//!
//! let cache = LruCache::new(3).unwrap();
//! let log_eviction = EvictionCallback::new(|key| log::info!("evicted {}", key));
//!
//! cache.add_or_update("a", Arc::new(vec![1u8, 2, 3]), Some(log_eviction)).unwrap();
//! let value = cache.try_get("a").unwrap().expect("just inserted");
//! assert_eq!(value.len(), 3);
//!
//! assert!(cache.try_remove("a").unwrap());
//! assert_eq!(cache.count(), 0);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod error;

// Re-export core types
pub use cache::{CacheStatistics, EvictionCallback, LruCache, StatisticsSnapshot};
pub use config::{Config, LruCacheConfig};
pub use error::{CacheError, Result};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
