//! Named profile-set records for a data source.

use std::sync::Arc;

use crate::binary::BinaryReader;
use crate::entities::{AsciiString, EntityFactory};
use crate::{Dataset, Result};

/// Record size in bytes.
const RECORD_SIZE: usize = 4;

/// A named set of profiles associated with a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Map {
    index: u32,
    name_offset: u32,
}

impl Map {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The map name, resolved from the strings section.
    pub fn name(&self, dataset: &Dataset) -> Result<Arc<AsciiString>> {
        dataset.strings()?.get(self.name_offset)
    }
}

/// Factory for [`Map`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapFactory;

impl EntityFactory for MapFactory {
    type Entity = Map;

    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<Map> {
        Ok(Map {
            index,
            name_offset: reader.read_u32()?,
        })
    }

    fn record_length(&self) -> Option<usize> {
        Some(RECORD_SIZE)
    }

    fn entity_length(&self, _entity: &Map) -> usize {
        RECORD_SIZE
    }
}
