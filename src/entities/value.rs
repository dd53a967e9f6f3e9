//! Concrete property-value records.

use std::sync::Arc;

use crate::binary::BinaryReader;
use crate::entities::{AsciiString, EntityFactory, Property};
use crate::{Dataset, Result};

/// Record size in bytes.
const RECORD_SIZE: usize = 14;

/// One concrete string-valued option of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Value {
    index: u32,
    property_index: u16,
    name_offset: u32,
    description_offset: u32,
    url_offset: u32,
}

impl Value {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The value text, resolved from the strings section.
    pub fn name(&self, dataset: &Dataset) -> Result<Arc<AsciiString>> {
        dataset.strings()?.get(self.name_offset)
    }

    pub fn description(&self, dataset: &Dataset) -> Result<Arc<AsciiString>> {
        dataset.strings()?.get(self.description_offset)
    }

    pub fn url(&self, dataset: &Dataset) -> Result<Arc<AsciiString>> {
        dataset.strings()?.get(self.url_offset)
    }

    /// The property this value belongs to.
    pub fn property<'d>(&self, dataset: &'d Dataset) -> Result<&'d Property> {
        dataset.properties()?.get(u32::from(self.property_index))
    }
}

/// Factory for [`Value`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFactory;

impl EntityFactory for ValueFactory {
    type Entity = Value;

    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<Value> {
        Ok(Value {
            index,
            property_index: reader.read_u16()?,
            name_offset: reader.read_u32()?,
            description_offset: reader.read_u32()?,
            url_offset: reader.read_u32()?,
        })
    }

    fn record_length(&self) -> Option<usize> {
        Some(RECORD_SIZE)
    }

    fn entity_length(&self, _entity: &Value) -> usize {
        RECORD_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::reader::test_reader;

    #[test]
    fn test_create() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(&200u32.to_le_bytes());
        bytes.extend_from_slice(&300u32.to_le_bytes());

        let mut reader = test_reader(bytes);
        let value = ValueFactory.create(9, &mut reader).unwrap();

        assert_eq!(value.index(), 9);
        assert_eq!(value.property_index, 3);
        assert_eq!(value.name_offset, 100);
        assert_eq!(reader.pos(), RECORD_SIZE as u64);
    }
}
