//! Per-section entity caches.
//!
//! Stream sections consult a cache before touching the reader pool. The
//! built-in implementation is a strict LRU (hashmap plus recency list)
//! behind a single mutex; callers may supply their own cache through the
//! [`EntityCache`] trait instead.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::entities::{AsciiString, Node, Profile, Signature, Value};
use crate::{Error, Result};

/// Default capacity of the strings cache.
pub const STRINGS_CACHE_SIZE: usize = 5000;
/// Default capacity of the nodes cache.
pub const NODES_CACHE_SIZE: usize = 15000;
/// Default capacity of the values cache.
pub const VALUES_CACHE_SIZE: usize = 500;
/// Default capacity of the profiles cache.
pub const PROFILES_CACHE_SIZE: usize = 600;
/// Default capacity of the signatures cache.
pub const SIGNATURES_CACHE_SIZE: usize = 500;

/// A caller-supplied cache consulted with an explicit check-then-put
/// discipline: the loader only `put`s fully materialized entities, so a
/// failing load stores nothing.
pub trait EntityCache<V>: Send + Sync {
    fn get(&self, key: u32) -> Option<Arc<V>>;
    fn put(&self, key: u32, value: Arc<V>);
}

/// Bounded LRU cache with a loader-on-miss read path.
pub struct LruEntityCache<V> {
    inner: Mutex<LruCache<u32, Arc<V>>>,
    requests: AtomicU64,
    misses: AtomicU64,
}

impl<V> LruEntityCache<V> {
    /// Create a cache bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| Error::Config("cache capacity must be at least 1".into()))?;
        Ok(Self {
            inner: Mutex::new(LruCache::new(capacity)),
            requests: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Fetch `key`, running `load` on a miss.
    ///
    /// The loader runs outside the cache lock: concurrent misses on the same
    /// key may each load, and the last insert wins. Only fully built values
    /// are ever inserted; a loader error stores nothing.
    pub fn get_or_load(
        &self,
        key: u32,
        load: impl FnOnce() -> Result<Arc<V>>,
    ) -> Result<Arc<V>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(hit) = self.inner.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = load()?;
        self.inner.lock().put(key, Arc::clone(&value));
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    /// Counters since creation.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.capacity(),
            len: self.len(),
            requests: self.requests.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache usage counters.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Maximum number of entries.
    pub capacity: usize,
    /// Current number of entries.
    pub len: usize,
    /// Total `get` requests served.
    pub requests: u64,
    /// Requests that had to run the loader.
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of requests served without the loader.
    pub fn hit_ratio(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        (self.requests - self.misses) as f64 / self.requests as f64
    }
}

/// How one cache slot is served.
pub enum CachePolicy<V> {
    /// No cache: every `get` goes through the reader pool.
    None,
    /// Built-in LRU with the given capacity.
    Lru(usize),
    /// Caller-supplied cache consulted before the pool.
    Custom(Arc<dyn EntityCache<V>>),
}

impl<V> Clone for CachePolicy<V> {
    fn clone(&self) -> Self {
        match self {
            CachePolicy::None => CachePolicy::None,
            CachePolicy::Lru(capacity) => CachePolicy::Lru(*capacity),
            CachePolicy::Custom(cache) => CachePolicy::Custom(Arc::clone(cache)),
        }
    }
}

impl<V> std::fmt::Debug for CachePolicy<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CachePolicy::None => f.write_str("None"),
            CachePolicy::Lru(capacity) => write!(f, "Lru({})", capacity),
            CachePolicy::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Cache policy per stream section.
///
/// Slots left at their defaults use the built-in LRU capacities; resident
/// sections have no slot because they never touch the pool after open.
#[derive(Debug, Clone)]
pub struct CacheSet {
    pub strings: CachePolicy<AsciiString>,
    pub nodes: CachePolicy<Node>,
    pub values: CachePolicy<Value>,
    pub profiles: CachePolicy<Profile>,
    pub signatures: CachePolicy<Signature>,
}

impl CacheSet {
    /// Disable caching for every slot.
    pub fn none() -> Self {
        Self {
            strings: CachePolicy::None,
            nodes: CachePolicy::None,
            values: CachePolicy::None,
            profiles: CachePolicy::None,
            signatures: CachePolicy::None,
        }
    }
}

impl Default for CacheSet {
    fn default() -> Self {
        Self {
            strings: CachePolicy::Lru(STRINGS_CACHE_SIZE),
            nodes: CachePolicy::Lru(NODES_CACHE_SIZE),
            values: CachePolicy::Lru(VALUES_CACHE_SIZE),
            profiles: CachePolicy::Lru(PROFILES_CACHE_SIZE),
            signatures: CachePolicy::Lru(SIGNATURES_CACHE_SIZE),
        }
    }
}
