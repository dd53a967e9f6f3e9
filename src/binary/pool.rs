//! Bounded pool of readers over a shared data source.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::binary::reader::{BinaryReader, DataSource};
use crate::{Error, Result};

/// Default number of file handles a file-backed pool may hold open.
pub const DEFAULT_POOL_SIZE: usize = 4;

struct PoolState {
    idle: Vec<BinaryReader>,
    outstanding: usize,
}

/// Hands out [`BinaryReader`]s for concurrent random access.
///
/// File-backed pools are bounded: `borrow` blocks once every handle is
/// checked out. Buffer-backed pools (memory-mapped or in-memory sources)
/// grow on demand since a reader is just a cursor.
pub struct ReaderPool {
    source: Arc<DataSource>,
    state: Mutex<PoolState>,
    available: Condvar,
    limit: Option<usize>,
    created: AtomicUsize,
    closed: AtomicBool,
}

impl ReaderPool {
    /// Create a pool over `source`. `size` bounds file-backed pools and is
    /// ignored for buffer-backed sources.
    pub fn new(source: DataSource, size: usize) -> Result<Self> {
        let limit = if source.is_buffer() {
            None
        } else {
            if size == 0 {
                return Err(Error::Config("reader pool size must be at least 1".into()));
            }
            Some(size)
        };
        Ok(Self {
            source: Arc::new(source),
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                outstanding: 0,
            }),
            available: Condvar::new(),
            limit,
            created: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Check a reader out of the pool, blocking while a bounded pool is
    /// exhausted. Fails with [`Error::Closed`] once the pool is closed,
    /// including for callers already blocked in `borrow`.
    pub fn borrow(&self) -> Result<PoolGuard<'_>> {
        let mut state = self.state.lock();
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(Error::Closed);
            }
            if let Some(reader) = state.idle.pop() {
                state.outstanding += 1;
                return Ok(PoolGuard {
                    pool: self,
                    reader: Some(reader),
                });
            }
            let exhausted = matches!(self.limit, Some(cap) if state.outstanding >= cap);
            if exhausted {
                self.available.wait(&mut state);
                continue;
            }
            state.outstanding += 1;
            drop(state);
            return match BinaryReader::create(&self.source) {
                Ok(reader) => {
                    self.created.fetch_add(1, Ordering::Relaxed);
                    Ok(PoolGuard {
                        pool: self,
                        reader: Some(reader),
                    })
                }
                Err(e) => {
                    self.state.lock().outstanding -= 1;
                    self.available.notify_one();
                    Err(e)
                }
            };
        }
    }

    /// Close the pool: drop idle readers and wake every blocked `borrow`.
    /// Idempotent; outstanding guards return their readers to the floor.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.state.lock().idle.clear();
        self.available.notify_all();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Total length of the underlying data source.
    pub fn source_len(&self) -> u64 {
        self.source.len()
    }

    /// High-water mark of readers ever created.
    pub fn readers_created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    fn release(&self, reader: BinaryReader) {
        let mut state = self.state.lock();
        state.outstanding -= 1;
        if !self.closed.load(Ordering::Acquire) {
            state.idle.push(reader);
        }
        drop(state);
        self.available.notify_one();
    }
}

/// RAII handle to a pooled reader; returns it on drop.
pub struct PoolGuard<'a> {
    pool: &'a ReaderPool,
    reader: Option<BinaryReader>,
}

impl std::ops::Deref for PoolGuard<'_> {
    type Target = BinaryReader;

    fn deref(&self) -> &BinaryReader {
        self.reader.as_ref().expect("reader present until drop")
    }
}

impl std::ops::DerefMut for PoolGuard<'_> {
    fn deref_mut(&mut self) -> &mut BinaryReader {
        self.reader.as_mut().expect("reader present until drop")
    }
}

impl Drop for PoolGuard<'_> {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            self.pool.release(reader);
        }
    }
}
