//! Thread-safe LRU cache with forced-eviction notifications
//!
//! The index (key to entry) and the recency order live together behind one
//! mutex. Every operation, including reads, takes that lock, because a read
//! moves the key to the head of the recency order. Forced evictions are handed
//! to the [`Notifier`] before the lock is released, so notices are queued in
//! eviction order. Queueing never blocks, so the lock is never held while
//! waiting on a callback.

use super::notifier::{EvictionCallback, EvictionNotice, Notifier};
use super::order::{NodeHandle, OrderList};
use super::stats::CacheStatistics;
use crate::config::{Config, LruCacheConfig};
use crate::error::{check_key, CacheError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

const OP_ADD_OR_UPDATE: &str = "add_or_update";
const OP_TRY_GET: &str = "try_get";
const OP_TRY_REMOVE: &str = "try_remove";
const OP_SET_CAPACITY: &str = "set_capacity";
const OP_CHECK_INVARIANTS: &str = "check_invariants";

/// Index record for one key
struct CacheEntry<V> {
    value: Arc<V>,
    handle: NodeHandle,
    /// Deduplicated by identity, in registration order
    callbacks: Vec<EvictionCallback>,
}

impl<V> CacheEntry<V> {
    /// Returns `true` if the callback was not registered yet
    fn register(&mut self, callback: EvictionCallback) -> bool {
        if self.callbacks.contains(&callback) {
            false
        } else {
            self.callbacks.push(callback);
            true
        }
    }
}

/// Key evicted by capacity pressure, with the callbacks it carried
struct Eviction {
    key: String,
    callbacks: Vec<EvictionCallback>,
}

/// Outcome of an insert-or-update under the lock
struct Upsert {
    inserted: bool,
    registered: bool,
}

/// State guarded by the cache mutex
struct CacheCore<V> {
    index: HashMap<String, CacheEntry<V>>,
    order: OrderList,
    capacity: usize,
    presize: bool,
}

impl<V> CacheCore<V> {
    fn new(capacity: usize, presize: bool) -> Result<Self> {
        let mut core = Self {
            index: HashMap::new(),
            order: OrderList::new(),
            capacity,
            presize,
        };
        if presize {
            core.reserve_total(capacity, "new")?;
        }
        Ok(core)
    }

    fn reserve_total(&mut self, total: usize, operation: &'static str) -> Result<()> {
        let additional = total.saturating_sub(self.index.len());
        self.index
            .try_reserve(additional)
            .map_err(|_| CacheError::resource_exhaustion(operation, additional))?;
        self.order
            .try_reserve_total(total)
            .map_err(|_| CacheError::resource_exhaustion(operation, additional))
    }

    fn stale_handle(operation: &'static str, key: &str) -> CacheError {
        CacheError::internal(operation, format!("order handle for key '{}' is stale", key))
    }

    /// Insert or update `key`. Entries expired to make room are pushed onto
    /// `evictions` even when the insertion itself then fails.
    fn upsert(
        &mut self,
        key: &str,
        value: Arc<V>,
        callback: Option<EvictionCallback>,
        evictions: &mut Vec<Eviction>,
    ) -> Result<Upsert> {
        if let Some(entry) = self.index.get_mut(key) {
            entry.value = value;
            self.order
                .move_to_front(entry.handle)
                .ok_or_else(|| Self::stale_handle(OP_ADD_OR_UPDATE, key))?;
            let registered = callback.map_or(false, |cb| entry.register(cb));
            return Ok(Upsert {
                inserted: false,
                registered,
            });
        }

        while self.index.len() >= self.capacity {
            let eviction = self.expire_oldest()?.ok_or_else(|| {
                CacheError::internal(
                    OP_ADD_OR_UPDATE,
                    "recency order is empty while index is at capacity",
                )
            })?;
            evictions.push(eviction);
        }

        self.index
            .try_reserve(1)
            .map_err(|_| CacheError::resource_exhaustion(OP_ADD_OR_UPDATE, 1))?;
        let handle = self
            .order
            .push_front(key.to_owned())
            .ok_or_else(|| CacheError::resource_exhaustion(OP_ADD_OR_UPDATE, 1))?;

        let mut entry = CacheEntry {
            value,
            handle,
            callbacks: Vec::new(),
        };
        let registered = callback.map_or(false, |cb| entry.register(cb));
        self.index.insert(key.to_owned(), entry);

        Ok(Upsert {
            inserted: true,
            registered,
        })
    }

    /// Drop the least recently used entry. `Ok(None)` when the cache is empty.
    fn expire_oldest(&mut self) -> Result<Option<Eviction>> {
        let Some(key) = self.order.pop_back() else {
            return Ok(None);
        };
        let entry = self.index.remove(&key).ok_or_else(|| {
            CacheError::internal(
                OP_ADD_OR_UPDATE,
                format!("evicted key '{}' missing from index", key),
            )
        })?;
        log::debug!("Expired least recently used key '{}'", key);
        Ok(Some(Eviction {
            key,
            callbacks: entry.callbacks,
        }))
    }

    fn get(&mut self, key: &str) -> Result<Option<Arc<V>>> {
        let Some(entry) = self.index.get(key) else {
            return Ok(None);
        };
        self.order
            .move_to_front(entry.handle)
            .ok_or_else(|| Self::stale_handle(OP_TRY_GET, key))?;
        Ok(Some(Arc::clone(&entry.value)))
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let Some(entry) = self.index.remove(key) else {
            return Ok(false);
        };
        self.order
            .remove(entry.handle)
            .ok_or_else(|| Self::stale_handle(OP_TRY_REMOVE, key))?;
        Ok(true)
    }

    fn set_capacity(&mut self, capacity: usize) -> Result<bool> {
        let count = self.index.len();
        if capacity < count {
            log::warn!(
                "Rejected capacity {} below current count {}",
                capacity,
                count
            );
            return Ok(false);
        }
        if self.presize {
            if capacity > self.capacity {
                self.reserve_total(capacity, OP_SET_CAPACITY)?;
            } else {
                self.index.shrink_to(capacity);
                self.order.shrink_to(capacity);
            }
        }
        log::debug!("Capacity changed from {} to {}", self.capacity, capacity);
        self.capacity = capacity;
        Ok(true)
    }

    fn check_invariants(&self) -> Result<()> {
        let fail = |message: String| CacheError::internal(OP_CHECK_INVARIANTS, message);

        if self.index.len() != self.order.len() {
            return Err(fail(format!(
                "index holds {} keys, order holds {}",
                self.index.len(),
                self.order.len()
            )));
        }
        if self.index.len() > self.capacity {
            return Err(fail(format!(
                "{} entries exceed capacity {}",
                self.index.len(),
                self.capacity
            )));
        }
        self.order.validate_links().map_err(fail)?;
        for (key, entry) in &self.index {
            match self.order.key(entry.handle) {
                Some(linked) if linked == key.as_str() => {}
                Some(linked) => {
                    return Err(fail(format!(
                        "handle for '{}' resolves to '{}'",
                        key, linked
                    )));
                }
                None => return Err(fail(format!("handle for '{}' is stale", key))),
            }
        }
        Ok(())
    }
}

/// Bounded, thread-safe LRU cache of shared values keyed by string
///
/// Values are stored as `Arc<V>` and handed back by reference count, never
/// copied, so mutation through interior mutability is visible to every
/// reader. Callbacks registered through [`add_or_update`](Self::add_or_update)
/// run on a background thread when their key is evicted to make room; explicit
/// removal never runs them.
///
/// # Examples
///
/// ```rust
/// use evicache::{EvictionCallback, LruCache};
/// use std::sync::Arc;
///
/// let cache = LruCache::new(2).unwrap();
/// let on_evict = EvictionCallback::new(|key| println!("{} was evicted", key));
///
/// assert!(cache.add_or_update("a", Arc::new(1), Some(on_evict.clone())).unwrap());
/// assert!(cache.add_or_update("b", Arc::new(2), None).unwrap());
///
/// // Reading "a" makes "b" the eviction candidate
/// assert_eq!(cache.try_get("a").unwrap().as_deref(), Some(&1));
/// cache.add_or_update("c", Arc::new(3), None).unwrap();
///
/// assert!(cache.try_get("b").unwrap().is_none());
/// assert_eq!(cache.count(), 2);
/// ```
pub struct LruCache<V> {
    core: Mutex<CacheCore<V>>,
    notifier: Notifier,
    stats: Arc<CacheStatistics>,
}

impl<V> LruCache<V> {
    /// Create a cache holding at most `capacity` entries with default settings
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(LruCacheConfig::with_capacity(capacity))
    }

    /// Create a cache from a validated configuration
    pub fn with_config(config: LruCacheConfig) -> Result<Self> {
        config.validate()?;

        let stats = Arc::new(CacheStatistics::new(config.enable_statistics));
        let core = CacheCore::new(config.capacity, config.presize_index)?;
        let notifier = Notifier::spawn(
            &config.notifier_thread_name,
            config.notifier_backlog_warning,
            Arc::clone(&stats),
        )?;

        Ok(Self {
            core: Mutex::new(core),
            notifier,
            stats,
        })
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.core.lock().capacity
    }

    /// Change the maximum number of entries
    ///
    /// Returns `Ok(false)` and leaves the capacity unchanged when `capacity` is
    /// below the current count. Zero is an invalid argument.
    pub fn set_capacity(&self, capacity: usize) -> Result<bool> {
        if capacity == 0 {
            return Err(CacheError::invalid_argument("capacity must be greater than 0"));
        }
        let result = self.core.lock().set_capacity(capacity);
        result.map_err(|e| Self::log_failure(OP_SET_CAPACITY, e))
    }

    /// Number of stored entries
    pub fn count(&self) -> usize {
        self.core.lock().index.len()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.count()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Insert `value` under `key`, or replace the value of an existing key
    ///
    /// Either way the key becomes the most recently used. `callback`, if given
    /// and not already registered for this key, is added to the callbacks run
    /// when the key is evicted by capacity pressure.
    ///
    /// Returns `true` for a fresh insertion and `false` for an update. Passing
    /// `None` as the value fails with [`CacheError::InvalidArgument`].
    pub fn add_or_update<T>(
        &self,
        key: &str,
        value: T,
        callback: Option<EvictionCallback>,
    ) -> Result<bool>
    where
        T: Into<Option<Arc<V>>>,
    {
        check_key(key)?;
        let value = value
            .into()
            .ok_or_else(|| CacheError::invalid_argument("value must not be null"))?;

        let result = {
            let mut core = self.core.lock();
            let mut evictions = Vec::new();
            let result = core.upsert(key, value, callback, &mut evictions);
            // Queued under the lock so notices keep the eviction order
            for eviction in evictions {
                self.stats.record_eviction();
                if !eviction.callbacks.is_empty() {
                    let notice =
                        EvictionNotice::new(eviction.key, eviction.callbacks, OP_ADD_OR_UPDATE);
                    self.notifier.notify(notice);
                }
            }
            result
        };

        let upsert = result.map_err(|e| Self::log_failure(OP_ADD_OR_UPDATE, e))?;

        if upsert.inserted {
            self.stats.record_insert();
        } else {
            self.stats.record_update();
        }
        if upsert.registered {
            self.stats.record_registration();
        }
        Ok(upsert.inserted)
    }

    /// Look up `key`, marking it most recently used on a hit
    pub fn try_get(&self, key: &str) -> Result<Option<Arc<V>>> {
        check_key(key)?;
        let result = self.core.lock().get(key);
        let value = result.map_err(|e| Self::log_failure(OP_TRY_GET, e))?;
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        Ok(value)
    }

    /// Remove `key` without running its eviction callbacks
    ///
    /// Returns `true` if the key was present.
    pub fn try_remove(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        let result = self.core.lock().remove(key);
        let removed = result.map_err(|e| Self::log_failure(OP_TRY_REMOVE, e))?;
        if removed {
            self.stats.record_remove();
        }
        Ok(removed)
    }

    /// Whether `key` is present. Does not affect recency.
    pub fn contains_key(&self, key: &str) -> bool {
        self.core.lock().index.contains_key(key)
    }

    /// Key that the next forced eviction would remove
    pub fn peek_lru(&self) -> Option<String> {
        self.core.lock().order.back().map(str::to_owned)
    }

    /// Snapshot of the keys, most recently used first
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.core.lock().order.iter().map(str::to_owned).collect()
    }

    /// Remove every entry. No eviction callbacks run.
    pub fn clear(&self) {
        let mut core = self.core.lock();
        core.index.clear();
        core.order.clear();
    }

    /// Verify that index and order agree and respect the capacity
    pub fn check_invariants(&self) -> Result<()> {
        self.core.lock().check_invariants()
    }

    /// Block until every eviction notice raised so far has been dispatched
    ///
    /// Notices raised by callbacks while the flush is in progress may still be
    /// pending when it returns. Returns immediately when called from a callback.
    pub fn flush_notifications(&self) {
        self.notifier.flush();
    }

    /// Number of eviction notices queued but not yet dispatched
    pub fn pending_notifications(&self) -> usize {
        self.notifier.pending()
    }

    /// Cache statistics
    pub fn stats(&self) -> &CacheStatistics {
        &self.stats
    }

    fn log_failure(operation: &'static str, error: CacheError) -> CacheError {
        log::error!("{} failed [{}]: {}", operation, error.category(), error);
        error
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.lock();
        f.debug_struct("LruCache")
            .field("count", &core.index.len())
            .field("capacity", &core.capacity)
            .field("notifier", &self.notifier)
            .finish()
    }
}
