//! Document Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// ID of the document node, always the first arena slot
pub const DOCUMENT_NODE: NodeId = 0;

/// Type of node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// DOCTYPE declaration
    DocType,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the document node and detached nodes)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the name (elements, PI targets)
    pub name_id: u32,
    /// Index into string pool for character data (text, CDATA, comments, PI data, doctype)
    pub value_id: u32,
    /// Start of attributes in attribute arena (for elements)
    pub attr_start: u32,
    /// Number of attributes
    pub attr_count: u16,
}

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Node {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            value_id: 0,
            attr_start: 0,
            attr_count: 0,
        }
    }

    /// Create the document node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document)
    }

    /// Create a detached element node
    pub fn element(name_id: u32) -> Self {
        Node {
            name_id,
            ..Self::with_kind(NodeKind::Element)
        }
    }

    /// Create a detached character-data node (text, CDATA, comment, doctype)
    pub fn character_data(kind: NodeKind, value_id: u32) -> Self {
        Node {
            value_id,
            ..Self::with_kind(kind)
        }
    }

    /// Create a detached processing instruction node
    pub fn processing_instruction(name_id: u32, value_id: u32) -> Self {
        Node {
            name_id,
            value_id,
            ..Self::with_kind(NodeKind::ProcessingInstruction)
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this node carries text that is part of the document content
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone, Copy)]
pub struct Attribute {
    /// Index into string pool for attribute name
    pub name_id: u32,
    /// Index into string pool for attribute value
    pub value_id: u32,
}

impl Attribute {
    pub fn new(name_id: u32, value_id: u32) -> Self {
        Attribute { name_id, value_id }
    }
}
