//! Node records: vertices of the user-agent prefix tree.

use std::sync::Arc;

use crate::binary::{BinaryReader, Version};
use crate::entities::{AsciiString, EntityFactory};
use crate::{Dataset, Error, Result};

/// Fixed prefix shared by both record versions.
const BASE_RECORD_SIZE: usize = 16;
/// `is_string u8, value i32, related_node_offset u32`
const CHILD_INDEX_SIZE: usize = 9;
/// `value i16, related_node_offset u32`
const NUMERIC_INDEX_SIZE: usize = 6;

/// Reference from a node to one of its children.
///
/// `value` packs up to four matched characters inline, or is a strings
/// offset when `is_string` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeIndex {
    is_string: bool,
    value: i32,
    related_node_offset: u32,
}

impl NodeIndex {
    /// Byte offset of the child node inside the nodes section.
    pub fn related_node_offset(&self) -> u32 {
        self.related_node_offset
    }

    /// The characters this child matches.
    pub fn characters(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        if self.is_string {
            Ok(dataset
                .strings()?
                .get(self.value as u32)?
                .as_bytes()
                .to_vec())
        } else {
            let packed = self.value.to_le_bytes();
            let used = packed.iter().position(|&b| b == 0).unwrap_or(4);
            Ok(packed[..used].to_vec())
        }
    }

    /// Materialize the child node.
    pub fn node(&self, dataset: &Dataset) -> Result<Arc<Node>> {
        dataset.nodes()?.get(self.related_node_offset)
    }
}

/// Reference from a node to a child matched by a numeric token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeNumericIndex {
    value: i16,
    related_node_offset: u32,
}

impl NodeNumericIndex {
    pub fn value(&self) -> i16 {
        self.value
    }

    pub fn related_node_offset(&self) -> u32 {
        self.related_node_offset
    }

    pub fn node(&self, dataset: &Dataset) -> Result<Arc<Node>> {
        dataset.nodes()?.get(self.related_node_offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeDetail {
    /// 3.1 stores its ranked-signature indexes inline.
    V31 { ranked_signature_indexes: Vec<u32> },
    /// 3.2 points into the node-ranked-signature-indexes side-table.
    V32 {
        ranked_signature_count: u16,
        first_ranked_signature_index: Option<u32>,
    },
}

/// A prefix-tree vertex over user-agent tokens.
///
/// `offset` is the record's byte offset inside the nodes section; child and
/// parent references use the same offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    offset: u32,
    position: i16,
    next_character_position: i16,
    parent_offset: i32,
    character_string_offset: i32,
    children: Vec<NodeIndex>,
    numeric_children: Vec<NodeNumericIndex>,
    detail: NodeDetail,
}

impl Node {
    /// Byte offset of this record inside the nodes section.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Character position in the user-agent this node matched at.
    pub fn position(&self) -> i16 {
        self.position
    }

    pub fn next_character_position(&self) -> i16 {
        self.next_character_position
    }

    /// Whether this node is a tree root.
    pub fn is_root(&self) -> bool {
        self.parent_offset < 0
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn numeric_children(&self) -> &[NodeNumericIndex] {
        &self.numeric_children
    }

    /// The parent node, or `None` at a root.
    pub fn parent(&self, dataset: &Dataset) -> Result<Option<Arc<Node>>> {
        if self.is_root() {
            return Ok(None);
        }
        Ok(Some(dataset.nodes()?.get(self.parent_offset as u32)?))
    }

    /// The characters this node matched, or `None` at a root.
    pub fn characters(&self, dataset: &Dataset) -> Result<Option<Arc<AsciiString>>> {
        if self.character_string_offset < 0 {
            return Ok(None);
        }
        Ok(Some(
            dataset.strings()?.get(self.character_string_offset as u32)?,
        ))
    }

    /// Number of ranked signatures that include this node.
    pub fn ranked_signature_count(&self) -> u32 {
        match &self.detail {
            NodeDetail::V31 {
                ranked_signature_indexes,
            } => ranked_signature_indexes.len() as u32,
            NodeDetail::V32 {
                ranked_signature_count,
                ..
            } => u32::from(*ranked_signature_count),
        }
    }

    /// Indexes into the ranked-signature-indexes table for this node.
    pub fn ranked_signature_indexes(&self, dataset: &Dataset) -> Result<Vec<u32>> {
        match &self.detail {
            NodeDetail::V31 {
                ranked_signature_indexes,
            } => Ok(ranked_signature_indexes.clone()),
            NodeDetail::V32 {
                ranked_signature_count,
                first_ranked_signature_index,
            } => {
                let Some(first) = *first_ranked_signature_index else {
                    return Ok(Vec::new());
                };
                let table = dataset.node_ranked_signature_indexes()?.ok_or_else(|| {
                    Error::format("3.2 node without node-ranked-signature-indexes table", 0)
                })?;
                (first..first + u32::from(*ranked_signature_count))
                    .map(|i| table.get(i))
                    .collect()
            }
        }
    }
}

/// Version-dispatching factory for [`Node`] records.
#[derive(Debug, Clone, Copy)]
pub struct NodeFactory {
    version: Version,
}

impl NodeFactory {
    pub fn new(version: Version) -> Self {
        Self { version }
    }
}

impl EntityFactory for NodeFactory {
    type Entity = Node;

    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<Node> {
        let position = reader.read_i16()?;
        let next_character_position = reader.read_i16()?;
        let parent_offset = reader.read_i32()?;
        let character_string_offset = reader.read_i32()?;
        let children_count = reader.read_u16()? as usize;
        let numeric_children_count = reader.read_u16()? as usize;

        let ranked_signature_count = match self.version {
            Version::V31 => reader.read_u32()?,
            Version::V32 => u32::from(reader.read_u16()?),
        };

        let mut children = Vec::with_capacity(children_count);
        for _ in 0..children_count {
            children.push(NodeIndex {
                is_string: reader.read_u8()? != 0,
                value: reader.read_i32()?,
                related_node_offset: reader.read_u32()?,
            });
        }
        let mut numeric_children = Vec::with_capacity(numeric_children_count);
        for _ in 0..numeric_children_count {
            numeric_children.push(NodeNumericIndex {
                value: reader.read_i16()?,
                related_node_offset: reader.read_u32()?,
            });
        }

        let detail = match self.version {
            Version::V31 => {
                let mut ranked_signature_indexes =
                    Vec::with_capacity(ranked_signature_count as usize);
                for _ in 0..ranked_signature_count {
                    ranked_signature_indexes.push(reader.read_u32()?);
                }
                NodeDetail::V31 {
                    ranked_signature_indexes,
                }
            }
            Version::V32 => {
                let first_ranked_signature_index = if ranked_signature_count > 0 {
                    Some(reader.read_u32()?)
                } else {
                    None
                };
                NodeDetail::V32 {
                    ranked_signature_count: ranked_signature_count as u16,
                    first_ranked_signature_index,
                }
            }
        };

        Ok(Node {
            offset: index,
            position,
            next_character_position,
            parent_offset,
            character_string_offset,
            children,
            numeric_children,
            detail,
        })
    }

    fn record_length(&self) -> Option<usize> {
        None
    }

    fn entity_length(&self, entity: &Node) -> usize {
        let refs = CHILD_INDEX_SIZE * entity.children.len()
            + NUMERIC_INDEX_SIZE * entity.numeric_children.len();
        match &entity.detail {
            NodeDetail::V31 {
                ranked_signature_indexes,
            } => BASE_RECORD_SIZE + 4 + refs + 4 * ranked_signature_indexes.len(),
            NodeDetail::V32 {
                first_ranked_signature_index,
                ..
            } => {
                BASE_RECORD_SIZE
                    + 2
                    + refs
                    + if first_ranked_signature_index.is_some() {
                        4
                    } else {
                        0
                    }
            }
        }
    }
}
