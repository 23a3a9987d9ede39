//! DOM Module - Arena-based mutable document
//!
//! Implements the document tree the highlighter edits:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for names, attribute values and text
//! - In-place mutation (insert, detach, wrap, unwrap, normalize)

pub mod document;
pub mod node;
pub mod serialize;
pub mod strings;

pub use document::Document;
pub use node::{Attribute, Node, NodeId, NodeKind, DOCUMENT_NODE};
pub use serialize::{inner_html, to_html};
pub use strings::StringPool;
