//! Markup Reader Module
//!
//! - SliceReader: zero-copy pull reader over a string slice
//! - Events: markup event types for pull parsing

pub mod events;
pub mod slice;

pub use events::{EndElement, MarkupEvent, StartElement};
pub use slice::SliceReader;
