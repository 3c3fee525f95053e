//! Arena-based representation of one evio event's structure tree.
//!
//! Nodes are stored flat in [`EvioTree::nodes`]; parent/child links are
//! indices into that arena rather than owned pointers, so the tree can be
//! built and walked without borrow-checker gymnastics.

use crate::byte_order::ByteOrder;
use crate::data_type::DataType;

/// One bank, segment, or tag-segment in an event's structure tree.
#[derive(Debug, Clone)]
pub struct EvioNode {
    pub tag: u16,
    /// Bank-only identifier; 0 for segment and tag-segment nodes.
    pub num: u8,
    /// For a structure node, the kind of its children. For a leaf, the
    /// primitive element type of its data.
    pub data_type: DataType,
    /// Trailing padding bytes (0-3) in this node's own data, applicable to
    /// byte/char leaves.
    pub padding: u8,
    /// Byte offset of this node's header in the buffer it was scanned from.
    pub position: usize,
    /// Total length of this node (header + data) in 32-bit words, as carried
    /// on the wire (bank: word 1 minus 1; segment/tag-segment: the length
    /// field verbatim).
    pub length: u32,
    /// Byte offset where this node's data begins.
    pub data_position: usize,
    /// Byte length of this node's data, including any trailing padding.
    pub data_length: usize,
    pub byte_order: ByteOrder,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl EvioNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && !self.data_type.is_structure()
    }

    /// Total byte span of this node, header included.
    pub fn total_len_bytes(&self) -> usize {
        (self.data_position - self.position) + self.data_length
    }
}

/// An event's full structure tree: the node arena plus a pre-order (parent
/// before children) traversal index, mirroring the flat `allNodes` list a
/// scan builds alongside the tree itself.
#[derive(Debug, Clone)]
pub struct EvioTree {
    pub nodes: Vec<EvioNode>,
    pub root: usize,
    pub all_nodes: Vec<usize>,
}

impl EvioTree {
    pub fn root(&self) -> &EvioNode {
        &self.nodes[self.root]
    }

    pub fn get(&self, index: usize) -> &EvioNode {
        &self.nodes[index]
    }

    pub fn children_of(&self, index: usize) -> impl Iterator<Item = &EvioNode> {
        self.nodes[index].children.iter().map(move |&i| &self.nodes[i])
    }
}
