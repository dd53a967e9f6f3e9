//! Root-node records: entry points into the node tree.

use std::sync::Arc;

use crate::binary::BinaryReader;
use crate::entities::{EntityFactory, Node};
use crate::{Dataset, Result};

/// Record size in bytes.
const RECORD_SIZE: usize = 4;

/// Entry point into the node tree for one starting character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootNode {
    index: u32,
    node_offset: u32,
}

impl RootNode {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Byte offset of the root node inside the nodes section.
    pub fn node_offset(&self) -> u32 {
        self.node_offset
    }

    /// Materialize the referenced node.
    pub fn node(&self, dataset: &Dataset) -> Result<Arc<Node>> {
        dataset.nodes()?.get(self.node_offset)
    }
}

/// Factory for [`RootNode`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootNodeFactory;

impl EntityFactory for RootNodeFactory {
    type Entity = RootNode;

    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<RootNode> {
        Ok(RootNode {
            index,
            node_offset: reader.read_u32()?,
        })
    }

    fn record_length(&self) -> Option<usize> {
        Some(RECORD_SIZE)
    }

    fn entity_length(&self, _entity: &RootNode) -> usize {
        RECORD_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::reader::test_reader;

    #[test]
    fn test_create() {
        let mut reader = test_reader(640u32.to_le_bytes().to_vec());
        let root = RootNodeFactory.create(2, &mut reader).unwrap();
        assert_eq!(root.index(), 2);
        assert_eq!(root.node_offset(), 640);
        assert_eq!(reader.pos(), RECORD_SIZE as u64);
    }
}
