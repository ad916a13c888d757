//! # Evicting LRU Cache
//!
//! Bounded key/value cache that evicts the least recently used entry when a
//! new key arrives at capacity, and reports those forced evictions to
//! registered callbacks on a background thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────── LruCache ─────────────────────────┐
//! │  Mutex<CacheCore>                                          │
//! │  ┌──────────────────────┐   ┌───────────────────────────┐  │
//! │  │ Index                │   │ Order (slab list)         │  │
//! │  │ key -> CacheEntry ───┼──>│ head (MRU) ... tail (LRU) │  │
//! │  │  value, handle, cbs  │   └───────────────────────────┘  │
//! │  └──────────────────────┘                                  │
//! ├────────────────────────────────────────────────────────────┤
//! │  Notifier: FIFO queue -> worker thread -> callbacks        │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use evicache::cache::{EvictionCallback, LruCache};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let evicted = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&evicted);
//! let on_evict = EvictionCallback::new(move |_key| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! let cache = LruCache::new(1).unwrap();
//! cache.add_or_update("A", Arc::new("v1"), Some(on_evict)).unwrap();
//! cache.add_or_update("B", Arc::new("v2"), None).unwrap();
//!
//! // Delivery is asynchronous
//! cache.flush_notifications();
//! assert_eq!(evicted.load(Ordering::SeqCst), 1);
//! ```
//!
//! The recency list and the notifier are internal:
//!
//! ```compile_fail
//! use evicache::cache::OrderList;
//! ```

mod lru_cache;
mod notifier;
mod order;
mod stats;

pub use lru_cache::LruCache;
pub use notifier::EvictionCallback;
pub use stats::{CacheStatistics, StatisticsSnapshot};
