//! Fully-resident lists for small, hot sections.

use ahash::AHashMap;

use crate::binary::{BinaryReader, Header};
use crate::entities::{AsciiStringFactory, EntityFactory, Property, PropertyFactory};
use crate::lists::StreamList;
use crate::{Error, Result};

/// Contiguous in-memory array over a section, filled once at open.
///
/// `read` positions the reader at the section start and materializes every
/// record in order; afterwards `get` is O(1) and never touches a reader.
pub struct MemoryFixedList<F: EntityFactory> {
    header: Header,
    factory: F,
    entries: Vec<F::Entity>,
}

impl<F: EntityFactory> MemoryFixedList<F> {
    pub(crate) fn new(header: Header, factory: F) -> Self {
        Self {
            header,
            factory,
            entries: Vec::new(),
        }
    }

    /// Materialize the whole section. Records must exactly fill the body.
    pub(crate) fn read(&mut self, reader: &mut BinaryReader) -> Result<()> {
        reader.set_pos(u64::from(self.header.start));
        let mut entries = Vec::with_capacity(self.header.count as usize);
        for index in 0..self.header.count {
            entries.push(self.factory.create(index, reader)?);
        }
        if reader.pos() != self.header.end() {
            return Err(Error::format(
                format!(
                    "resident section records end at {} instead of {}",
                    reader.pos(),
                    self.header.end()
                ),
                u64::from(self.header.start),
            ));
        }
        self.entries = entries;
        Ok(())
    }

    /// Number of entities in the section.
    pub fn size(&self) -> u32 {
        self.header.count
    }

    /// The entity at `index`.
    pub fn get(&self, index: u32) -> Result<&F::Entity> {
        self.entries
            .get(index as usize)
            .ok_or(Error::InvalidIndex {
                index,
                limit: self.header.count,
            })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, F::Entity> {
        self.entries.iter()
    }
}

/// Resident properties section with a name index built at open.
pub struct PropertiesList {
    inner: MemoryFixedList<PropertyFactory>,
    by_name: AHashMap<String, u32>,
}

impl PropertiesList {
    pub(crate) fn new(header: Header) -> Self {
        Self {
            inner: MemoryFixedList::new(header, PropertyFactory),
            by_name: AHashMap::new(),
        }
    }

    pub(crate) fn read(&mut self, reader: &mut BinaryReader) -> Result<()> {
        self.inner.read(reader)
    }

    /// Resolve every property name and build the lookup index. Runs after
    /// `read`, with no pooled reader held by the caller.
    pub(crate) fn index_names(&mut self, strings: &StreamList<AsciiStringFactory>) -> Result<()> {
        let mut by_name = AHashMap::with_capacity(self.inner.entries.len());
        for property in &self.inner.entries {
            let name = strings.get(property.name_offset())?;
            by_name.insert(name.as_str().into_owned(), property.index());
        }
        self.by_name = by_name;
        Ok(())
    }

    pub fn size(&self) -> u32 {
        self.inner.size()
    }

    pub fn get(&self, index: u32) -> Result<&Property> {
        self.inner.get(index)
    }

    /// Look a property up by its exact name.
    pub fn by_name(&self, name: &str) -> Option<&Property> {
        let index = *self.by_name.get(name)?;
        self.inner.entries.get(index as usize)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.inner.iter()
    }
}
