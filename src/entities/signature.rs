//! Signature records: stored device fingerprints.

use bitflags::bitflags;
use std::sync::Arc;

use crate::binary::{BinaryReader, Version};
use crate::entities::{EntityFactory, Node, Profile};
use crate::{Dataset, Error, Result};

bitflags! {
    /// Flags byte carried by 3.2 signature records.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SignatureFlags: u8 {
        /// The user-agent tail is not fully covered by the node sequence.
        const UNMATCHED_TAIL = 0b0000_0001;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SignatureDetail {
    /// 3.1 stores node offsets inline, `-1` padding unused slots.
    V31 { node_offsets: Vec<i32> },
    /// 3.2 points into the signature-node-offsets side-table.
    V32 {
        node_count: u8,
        first_node_offset_index: u32,
        rank: u32,
        flags: SignatureFlags,
    },
}

/// A stored device fingerprint: profile references plus the node sequence
/// that matches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    index: u32,
    profile_offsets: Vec<i32>,
    detail: SignatureDetail,
}

impl Signature {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Byte offsets of the referenced profiles, padding slots removed.
    pub fn profile_offsets(&self) -> Vec<u32> {
        self.profile_offsets
            .iter()
            .filter(|&&offset| offset >= 0)
            .map(|&offset| offset as u32)
            .collect()
    }

    /// Materialize every profile the signature references.
    pub fn profiles(&self, dataset: &Dataset) -> Result<Vec<Arc<Profile>>> {
        let profiles = dataset.profiles()?;
        self.profile_offsets()
            .into_iter()
            .map(|offset| profiles.get(offset))
            .collect()
    }

    /// Byte offsets of the signature's nodes, in match order.
    pub fn node_offsets(&self, dataset: &Dataset) -> Result<Vec<u32>> {
        match &self.detail {
            SignatureDetail::V31 { node_offsets } => Ok(node_offsets
                .iter()
                .filter(|&&offset| offset >= 0)
                .map(|&offset| offset as u32)
                .collect()),
            SignatureDetail::V32 {
                node_count,
                first_node_offset_index,
                ..
            } => {
                let table = dataset.signature_node_offsets()?.ok_or_else(|| {
                    Error::format("3.2 signature without signature-node-offsets table", 0)
                })?;
                let first = *first_node_offset_index;
                (first..first + u32::from(*node_count))
                    .map(|i| table.get(i))
                    .collect()
            }
        }
    }

    /// Materialize every node the signature references.
    pub fn nodes(&self, dataset: &Dataset) -> Result<Vec<Arc<Node>>> {
        let offsets = self.node_offsets(dataset)?;
        let nodes = dataset.nodes()?;
        offsets.into_iter().map(|offset| nodes.get(offset)).collect()
    }

    /// Popularity rank; stored by 3.2 records only.
    pub fn rank(&self) -> Option<u32> {
        match &self.detail {
            SignatureDetail::V31 { .. } => None,
            SignatureDetail::V32 { rank, .. } => Some(*rank),
        }
    }

    /// Flags byte; stored by 3.2 records only.
    pub fn flags(&self) -> Option<SignatureFlags> {
        match &self.detail {
            SignatureDetail::V31 { .. } => None,
            SignatureDetail::V32 { flags, .. } => Some(*flags),
        }
    }
}

/// Version-dispatching factory for [`Signature`] records.
///
/// Record sizes depend on the per-signature slot counts declared in the
/// container preamble.
#[derive(Debug, Clone, Copy)]
pub struct SignatureFactory {
    version: Version,
    profiles_count: u32,
    nodes_count: u32,
}

impl SignatureFactory {
    pub fn new(version: Version, profiles_count: u32, nodes_count: u32) -> Self {
        Self {
            version,
            profiles_count,
            nodes_count,
        }
    }

    fn fixed_length(&self) -> usize {
        let profiles = 4 * self.profiles_count as usize;
        match self.version {
            Version::V31 => profiles + 4 * self.nodes_count as usize,
            Version::V32 => profiles + 10,
        }
    }
}

impl EntityFactory for SignatureFactory {
    type Entity = Signature;

    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<Signature> {
        let mut profile_offsets = Vec::with_capacity(self.profiles_count as usize);
        for _ in 0..self.profiles_count {
            profile_offsets.push(reader.read_i32()?);
        }
        let detail = match self.version {
            Version::V31 => {
                let mut node_offsets = Vec::with_capacity(self.nodes_count as usize);
                for _ in 0..self.nodes_count {
                    node_offsets.push(reader.read_i32()?);
                }
                SignatureDetail::V31 { node_offsets }
            }
            Version::V32 => SignatureDetail::V32 {
                node_count: reader.read_u8()?,
                first_node_offset_index: reader.read_u32()?,
                rank: reader.read_u32()?,
                flags: SignatureFlags::from_bits_truncate(reader.read_u8()?),
            },
        };
        Ok(Signature {
            index,
            profile_offsets,
            detail,
        })
    }

    fn record_length(&self) -> Option<usize> {
        Some(self.fixed_length())
    }

    fn entity_length(&self, _entity: &Signature) -> usize {
        self.fixed_length()
    }
}
