//! Typed entities materialized from data file sections.
//!
//! Each module defines one record kind together with its factory. Entities
//! are plain values carrying their section index; cross-references resolve
//! lazily through an explicit [`Dataset`](crate::Dataset) parameter, never
//! through stored pointers.

pub mod ascii_string;
pub mod component;
pub mod map;
pub mod node;
pub mod profile;
pub mod profile_offset;
pub mod property;
pub mod root_node;
pub mod signature;
pub mod value;

pub use ascii_string::{AsciiString, AsciiStringFactory};
pub use component::{Component, ComponentFactory, DEVICE_USER_AGENT_HEADERS, USER_AGENT_HEADER};
pub use map::{Map, MapFactory};
pub use node::{Node, NodeFactory, NodeIndex, NodeNumericIndex};
pub use profile::{Profile, ProfileFactory};
pub use profile_offset::{ProfileOffset, ProfileOffsetFactory};
pub use property::{Property, PropertyFactory, PropertyValueType};
pub use root_node::{RootNode, RootNodeFactory};
pub use signature::{Signature, SignatureFactory, SignatureFlags};
pub use value::{Value, ValueFactory};

use crate::binary::BinaryReader;
use crate::Result;

/// Materializes one entity kind from a positioned reader.
///
/// `create` must leave the reader advanced by exactly the record size on
/// success. Factories for self-sizing records report `record_length() ==
/// None` and loaders fall back to byte-offset keys for them.
pub trait EntityFactory {
    type Entity;

    /// Materialize the record starting at the reader's current position.
    /// `index` is the entity's key within its section: the record number for
    /// fixed-length kinds, the byte offset for self-sizing kinds.
    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<Self::Entity>;

    /// Constant record size in bytes, or `None` when the size must be
    /// derived from each materialized record.
    fn record_length(&self) -> Option<usize>;

    /// Serialized size of a materialized record; drives variable-record
    /// iteration.
    fn entity_length(&self, entity: &Self::Entity) -> usize;
}
