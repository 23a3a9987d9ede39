//! Error Types
//!
//! One error enum for the whole engine. Variants fall into three classes:
//! validation failures raised at the call that broke a precondition,
//! consistency failures raised only while consistency checks are enabled,
//! and pattern compilation failures. Soft misses (navigation past the end,
//! lookups that find nothing) are never errors.

use crate::dom::NodeId;
use thiserror::Error;

/// Engine result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller violated a precondition
    Validation,
    /// The index no longer matches the tree
    Consistency,
    /// A search pattern failed to compile
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("offset {offset} is outside the indexed text (length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("substring {offset}+{len} exceeds the indexed text (length {text_len})")]
    SubstrOutOfRange {
        offset: usize,
        len: usize,
        text_len: usize,
    },

    #[error("marker index {index} is out of bounds ({len} markers)")]
    MarkerOutOfBounds { index: usize, len: usize },

    #[error("invalid truncation bounds {start}..={end} for a node of length {len}")]
    InvalidTruncation { start: usize, end: usize, len: usize },

    #[error("offset {0} does not fall on a character boundary")]
    NotCharBoundary(usize),

    #[error("hit at offset {offset} has zero length")]
    EmptyHit { offset: usize },

    #[error("cursor index must be non-negative, got {0}")]
    NegativeCursorIndex(isize),

    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} is not a text node")]
    NotTextNode(NodeId),

    #[error("node {0} is not an element")]
    NotElement(NodeId),

    #[error("node {0} has no parent")]
    Detached(NodeId),

    #[error("cannot insert node {child} into its own subtree at {parent}")]
    Hierarchy { parent: NodeId, child: NodeId },

    #[error("markers are not contiguous at index {index}: expected offset {expected}, found {found}")]
    Discontiguous {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("indexed text has length {text_len} but markers cover {covered}")]
    CoverageMismatch { text_len: usize, covered: usize },

    #[error("marker {index} points at node {node} whose text no longer matches the index")]
    StaleMarker { index: usize, node: NodeId },

    #[error("invalid pattern: {0}")]
    Pattern(String),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Discontiguous { .. }
            | Error::CoverageMismatch { .. }
            | Error::StaleMarker { .. } => ErrorKind::Consistency,
            Error::Pattern(_) => ErrorKind::Pattern,
            _ => ErrorKind::Validation,
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Pattern(err.to_string())
    }
}
