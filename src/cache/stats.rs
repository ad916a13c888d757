//! Cache statistics for performance monitoring

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by the cache and its notifier
#[derive(Debug, Default)]
pub struct CacheStatistics {
    enabled: bool,

    /// Total number of lookups
    pub get_count: AtomicU64,

    /// Number of lookups that found the key
    pub hit_count: AtomicU64,

    /// Number of lookups that missed
    pub miss_count: AtomicU64,

    /// Fresh insertions
    pub insert_count: AtomicU64,

    /// In-place updates of existing keys
    pub update_count: AtomicU64,

    /// Explicit removals
    pub remove_count: AtomicU64,

    /// Forced capacity evictions
    pub eviction_count: AtomicU64,

    /// Callbacks newly registered against an entry
    pub callback_registrations: AtomicU64,

    /// Callback invocations that returned normally
    pub callbacks_invoked: AtomicU64,

    /// Callback invocations that panicked
    pub callback_failures: AtomicU64,
}

impl CacheStatistics {
    /// Create new statistics instance
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// Whether counters are being recorded
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get hit ratio in `[0, 1]`
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hit_count.load(Ordering::Relaxed) as f64;
        let total = self.get_count.load(Ordering::Relaxed) as f64;
        if total > 0.0 { hits / total } else { 0.0 }
    }

    #[inline]
    fn bump(&self, counter: &AtomicU64) {
        if self.enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a cache hit
    pub fn record_hit(&self) {
        self.bump(&self.get_count);
        self.bump(&self.hit_count);
    }

    /// Record a cache miss
    pub fn record_miss(&self) {
        self.bump(&self.get_count);
        self.bump(&self.miss_count);
    }

    /// Record a fresh insertion
    pub fn record_insert(&self) {
        self.bump(&self.insert_count);
    }

    /// Record an update of an existing key
    pub fn record_update(&self) {
        self.bump(&self.update_count);
    }

    /// Record an explicit removal
    pub fn record_remove(&self) {
        self.bump(&self.remove_count);
    }

    /// Record a forced eviction
    pub fn record_eviction(&self) {
        self.bump(&self.eviction_count);
    }

    /// Record a new callback registration
    pub fn record_registration(&self) {
        self.bump(&self.callback_registrations);
    }

    /// Record a completed callback
    pub fn record_callback_invoked(&self) {
        self.bump(&self.callbacks_invoked);
    }

    /// Record a panicked callback
    pub fn record_callback_failure(&self) {
        self.bump(&self.callback_failures);
    }

    /// Copy the counters into a plain, serializable value
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            get_count: self.get_count.load(Ordering::Relaxed),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            remove_count: self.remove_count.load(Ordering::Relaxed),
            eviction_count: self.eviction_count.load(Ordering::Relaxed),
            callback_registrations: self.callback_registrations.load(Ordering::Relaxed),
            callbacks_invoked: self.callbacks_invoked.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            hit_ratio: self.hit_ratio(),
        }
    }
}

/// Point-in-time copy of [`CacheStatistics`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    /// Value of `CacheStatistics::get_count`
    pub get_count: u64,
    /// Value of `CacheStatistics::hit_count`
    pub hit_count: u64,
    /// Value of `CacheStatistics::miss_count`
    pub miss_count: u64,
    /// Value of `CacheStatistics::insert_count`
    pub insert_count: u64,
    /// Value of `CacheStatistics::update_count`
    pub update_count: u64,
    /// Value of `CacheStatistics::remove_count`
    pub remove_count: u64,
    /// Value of `CacheStatistics::eviction_count`
    pub eviction_count: u64,
    /// Value of `CacheStatistics::callback_registrations`
    pub callback_registrations: u64,
    /// Value of `CacheStatistics::callbacks_invoked`
    pub callbacks_invoked: u64,
    /// Value of `CacheStatistics::callback_failures`
    pub callback_failures: u64,
    /// Hits divided by lookups
    pub hit_ratio: f64,
}
