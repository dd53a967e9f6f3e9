//! Packed 32-bit integer side-tables.

use std::sync::Arc;

use crate::binary::{Header, ReaderPool};
use crate::{Error, Result};

/// Read-only view over a section of packed little-endian u32 words,
/// fetched on demand through the reader pool.
pub struct IntegerList {
    header: Header,
    pool: Arc<ReaderPool>,
}

impl IntegerList {
    pub(crate) fn new(header: Header, pool: Arc<ReaderPool>) -> Result<Self> {
        if u64::from(header.count) * 4 != u64::from(header.length) {
            return Err(Error::format(
                format!(
                    "integer section of {} words does not fill {} bytes",
                    header.count, header.length
                ),
                u64::from(header.start),
            ));
        }
        Ok(Self { header, pool })
    }

    /// Number of words in the table.
    pub fn len(&self) -> u32 {
        self.header.count
    }

    pub fn is_empty(&self) -> bool {
        self.header.count == 0
    }

    /// Read the word at `index`.
    pub fn get(&self, index: u32) -> Result<u32> {
        if index >= self.header.count {
            return Err(Error::InvalidIndex {
                index,
                limit: self.header.count,
            });
        }
        let mut reader = self.pool.borrow()?;
        reader.set_pos(u64::from(self.header.start) + u64::from(index) * 4);
        reader.read_u32()
    }
}
