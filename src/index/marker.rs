//! Marker - offset-to-node mapping entry

use crate::dom::NodeId;

/// A text node and the global offset of its first byte in the flattened text
///
/// Markers are only meaningful against the index that produced them; a
/// truncation replaces the node a marker refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// Text node this marker maps
    pub node: NodeId,
    /// Global byte offset of the node's first byte
    pub offset: usize,
}

impl Marker {
    #[inline]
    pub fn new(node: NodeId, offset: usize) -> Self {
        Marker { node, offset }
    }
}
