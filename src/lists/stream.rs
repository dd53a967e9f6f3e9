//! Lazy random-access lists over stream sections.

use std::sync::Arc;

use crate::binary::{Header, ReaderPool};
use crate::cache::{CachePolicy, CacheStats, EntityCache, LruEntityCache};
use crate::entities::EntityFactory;
use crate::{Error, Result};

enum CacheVariant<V> {
    /// Every `get` borrows a reader; safe under any concurrency.
    Direct,
    /// Single `get_or_load` against the built-in LRU.
    Lru(LruEntityCache<V>),
    /// Check-then-put against a caller-supplied cache.
    Put(Arc<dyn EntityCache<V>>),
}

/// Lazy list over one section: entities materialize on demand through the
/// reader pool, with an optional cache interposed.
///
/// Keys follow the section kind: fixed-length sections take record numbers
/// in `0..count`, self-sizing sections take byte offsets in `0..length`.
/// Anything else fails with [`Error::InvalidIndex`].
pub struct StreamList<F: EntityFactory> {
    header: Header,
    pool: Arc<ReaderPool>,
    factory: F,
    record_length: Option<usize>,
    cache: CacheVariant<F::Entity>,
}

impl<F: EntityFactory> StreamList<F> {
    pub(crate) fn new(
        header: Header,
        pool: Arc<ReaderPool>,
        factory: F,
        policy: CachePolicy<F::Entity>,
    ) -> Result<Self> {
        let record_length = factory.record_length();
        if let Some(size) = record_length {
            if size == 0 || size as u64 * u64::from(header.count) != u64::from(header.length) {
                return Err(Error::format(
                    format!(
                        "{} records of {} bytes do not fill a {}-byte section",
                        header.count, size, header.length
                    ),
                    u64::from(header.start),
                ));
            }
        }
        let cache = match policy {
            CachePolicy::None => CacheVariant::Direct,
            CachePolicy::Lru(capacity) => CacheVariant::Lru(LruEntityCache::new(capacity)?),
            CachePolicy::Custom(cache) => CacheVariant::Put(cache),
        };
        Ok(Self {
            header,
            pool,
            factory,
            record_length,
            cache,
        })
    }

    /// Number of logical entities in the section.
    pub fn size(&self) -> u32 {
        self.header.count
    }

    /// Byte length of the section body; the key limit for self-sizing
    /// sections.
    pub fn byte_length(&self) -> u32 {
        self.header.length
    }

    fn key_limit(&self) -> u32 {
        match self.record_length {
            Some(_) => self.header.count,
            None => self.header.length,
        }
    }

    /// Materialize the entity for `key`, consulting the cache first.
    pub fn get(&self, key: u32) -> Result<Arc<F::Entity>> {
        if key >= self.key_limit() {
            return Err(Error::InvalidIndex {
                index: key,
                limit: self.key_limit(),
            });
        }
        match &self.cache {
            CacheVariant::Direct => self.load_direct(key),
            CacheVariant::Lru(cache) => cache.get_or_load(key, || self.load_direct(key)),
            CacheVariant::Put(cache) => {
                if let Some(hit) = cache.get(key) {
                    return Ok(hit);
                }
                let value = self.load_direct(key)?;
                cache.put(key, Arc::clone(&value));
                Ok(value)
            }
        }
    }

    fn load_direct(&self, key: u32) -> Result<Arc<F::Entity>> {
        let mut reader = self.pool.borrow()?;
        let position = match self.record_length {
            Some(size) => u64::from(self.header.start) + u64::from(key) * size as u64,
            None => u64::from(self.header.start) + u64::from(key),
        };
        reader.set_pos(position);
        Ok(Arc::new(self.factory.create(key, &mut reader)?))
    }

    /// Walk the section in storage order.
    pub fn iter(&self) -> StreamIter<'_, F> {
        StreamIter {
            list: self,
            yielded: 0,
            position: 0,
            failed: false,
        }
    }

    /// Counters of the built-in LRU, when one is attached.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        match &self.cache {
            CacheVariant::Lru(cache) => Some(cache.stats()),
            _ => None,
        }
    }

    pub(crate) fn entity_length(&self, entity: &F::Entity) -> usize {
        self.factory.entity_length(entity)
    }
}

/// Cursor over a stream section.
///
/// For self-sizing records the next position is only known once the current
/// entity is materialized, so the cursor advances by `entity_length`. A
/// materialization failure is yielded once and fuses the iterator.
pub struct StreamIter<'a, F: EntityFactory> {
    list: &'a StreamList<F>,
    yielded: u32,
    position: u32,
    failed: bool,
}

impl<F: EntityFactory> Iterator for StreamIter<'_, F> {
    type Item = Result<Arc<F::Entity>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.yielded >= self.list.header.count {
            return None;
        }
        match self.list.get(self.position) {
            Ok(entity) => {
                self.yielded += 1;
                self.position += match self.list.record_length {
                    Some(_) => 1,
                    None => self.list.entity_length(&entity) as u32,
                };
                Some(Ok(entity))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
