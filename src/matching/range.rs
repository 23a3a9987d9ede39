//! Marker-relative ranges

use super::Hit;
use crate::index::{Marker, TextIndex};
use crate::error::{Error, Result};

/// A position inside the node of a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeDescriptor {
    pub marker: Marker,
    /// Byte offset from the start of the marker's node
    pub offset: usize,
}

impl RangeDescriptor {
    pub fn new(marker: Marker, offset: usize) -> Self {
        RangeDescriptor { marker, offset }
    }

    /// Global offset in the flattened text
    #[inline]
    pub fn global(&self) -> usize {
        self.marker.offset + self.offset
    }
}

/// A resolved span; `end` addresses the last byte of the span (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: RangeDescriptor,
    pub end: RangeDescriptor,
}

impl Range {
    pub fn new(start: RangeDescriptor, end: RangeDescriptor) -> Self {
        Range { start, end }
    }

    /// Whether both ends lie in the same text node
    #[inline]
    pub fn is_single_node(&self) -> bool {
        self.start.marker.node == self.end.marker.node
    }

    /// Global offset of the first byte
    #[inline]
    pub fn start_offset(&self) -> usize {
        self.start.global()
    }

    /// Global offset one past the last byte
    #[inline]
    pub fn end_offset(&self) -> usize {
        self.end.global() + 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end_offset() - self.start_offset()
    }
}

/// Resolve a raw hit against the current index
///
/// When the hit ends inside its start node the end descriptor is derived
/// arithmetically from the start marker.
pub fn resolve(index: &TextIndex, hit: Hit) -> Result<Range> {
    if hit.len == 0 {
        return Err(Error::EmptyHit { offset: hit.offset });
    }
    let last = hit
        .offset
        .checked_add(hit.len - 1)
        .ok_or(Error::OffsetOutOfRange {
            offset: hit.offset,
            len: index.text_len(),
        })?;
    if last >= index.text_len() {
        return Err(Error::OffsetOutOfRange {
            offset: last,
            len: index.text_len(),
        });
    }
    let start_index = index.index_of(hit.offset)?;

    let text = index.text();
    for at in [hit.offset, hit.end()] {
        if !text.is_char_boundary(at) {
            return Err(Error::NotCharBoundary(at));
        }
    }

    let start_marker = index.at(start_index)?;
    let start_local = hit.offset - start_marker.offset;
    let start = RangeDescriptor::new(start_marker, start_local);

    if start_local + hit.len <= index.span_len(start_index)? {
        let end = RangeDescriptor::new(start_marker, start_local + hit.len - 1);
        return Ok(Range::new(start, end));
    }

    let end_marker = index.at(index.index_of(last)?)?;
    let end = RangeDescriptor::new(end_marker, last - end_marker.offset);
    Ok(Range::new(start, end))
}
