//! Profile records: a device's property values grouped by component.

use std::sync::Arc;

use crate::binary::BinaryReader;
use crate::entities::{Component, EntityFactory, Value};
use crate::{Dataset, Result};

/// Fixed metadata before the two index arrays.
const HEADER_SIZE: usize = 13;

/// A device's concrete value selection for one component.
///
/// `offset` is the record's byte offset inside the profiles section; the
/// profile-offsets section maps published profile ids to these offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    offset: u32,
    component_index: u8,
    profile_id: u32,
    value_indexes: Vec<u32>,
    signature_indexes: Vec<u32>,
}

impl Profile {
    /// Byte offset of this record inside the profiles section.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The published profile identifier.
    pub fn profile_id(&self) -> u32 {
        self.profile_id
    }

    /// Indexes of this profile's values in the values section.
    pub fn value_indexes(&self) -> &[u32] {
        &self.value_indexes
    }

    /// Indexes of the signatures that resolve to this profile.
    pub fn signature_indexes(&self) -> &[u32] {
        &self.signature_indexes
    }

    /// The component this profile describes.
    pub fn component<'d>(&self, dataset: &'d Dataset) -> Result<&'d Component> {
        dataset.components()?.get(u32::from(self.component_index))
    }

    /// Materialize every value of this profile.
    pub fn values(&self, dataset: &Dataset) -> Result<Vec<Arc<Value>>> {
        let values = dataset.values()?;
        let mut out = Vec::with_capacity(self.value_indexes.len());
        for &index in &self.value_indexes {
            out.push(values.get(index)?);
        }
        Ok(out)
    }
}

/// Factory for [`Profile`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileFactory;

impl EntityFactory for ProfileFactory {
    type Entity = Profile;

    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<Profile> {
        let component_index = reader.read_u8()?;
        let profile_id = reader.read_u32()?;
        let value_count = reader.read_u32()? as usize;
        let signature_count = reader.read_u32()? as usize;

        let mut value_indexes = Vec::with_capacity(value_count);
        for _ in 0..value_count {
            value_indexes.push(reader.read_u32()?);
        }
        let mut signature_indexes = Vec::with_capacity(signature_count);
        for _ in 0..signature_count {
            signature_indexes.push(reader.read_u32()?);
        }

        Ok(Profile {
            offset: index,
            component_index,
            profile_id,
            value_indexes,
            signature_indexes,
        })
    }

    fn record_length(&self) -> Option<usize> {
        None
    }

    fn entity_length(&self, entity: &Profile) -> usize {
        HEADER_SIZE + 4 * (entity.value_indexes.len() + entity.signature_indexes.len())
    }
}
