//! Profile-offset records: published profile id to record offset.

use std::sync::Arc;

use crate::binary::BinaryReader;
use crate::entities::{EntityFactory, Profile};
use crate::{Dataset, Result};

/// Record size in bytes.
const RECORD_SIZE: usize = 8;

/// Maps a published profile id to its record offset in the profiles section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileOffset {
    index: u32,
    profile_id: u32,
    offset: u32,
}

impl ProfileOffset {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The published profile identifier.
    pub fn profile_id(&self) -> u32 {
        self.profile_id
    }

    /// Byte offset of the profile record inside the profiles section.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Materialize the referenced profile.
    pub fn profile(&self, dataset: &Dataset) -> Result<Arc<Profile>> {
        dataset.profiles()?.get(self.offset)
    }
}

/// Factory for [`ProfileOffset`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileOffsetFactory;

impl EntityFactory for ProfileOffsetFactory {
    type Entity = ProfileOffset;

    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<ProfileOffset> {
        Ok(ProfileOffset {
            index,
            profile_id: reader.read_u32()?,
            offset: reader.read_u32()?,
        })
    }

    fn record_length(&self) -> Option<usize> {
        Some(RECORD_SIZE)
    }

    fn entity_length(&self, _entity: &ProfileOffset) -> usize {
        RECORD_SIZE
    }
}
