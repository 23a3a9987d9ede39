//! Text Index Module
//!
//! Flattened-text view of a document subtree with an offset-to-node map.
//!
//! ## Architecture
//!
//! ```text
//! TextIndex
//! ├── text: Arc<str>        # every text node under root, in pre-order
//! └── markers: Vec<Marker>  # (node, global offset), sorted and contiguous
//! ```
//!
//! Text under hidden elements (script, style, ...) is present in the
//! flattened text as a run of spaces of the same byte length, so offsets
//! stay aligned with the tree while searches never see that content.
//!
//! The index does not observe the document. Any mutation made outside
//! [`TextIndex::truncate`] invalidates it; the only recovery is a full
//! [`TextIndex::parse`].
//!
//! All offsets are UTF-8 byte offsets into the flattened text.

pub mod marker;
pub mod text_index;

pub use marker::Marker;
pub use text_index::TextIndex;
