//! Finder - lazy, forward-only range sequence over a match source

use super::range::{resolve, Range};
use super::MatchSource;
use crate::error::Result;
use crate::index::TextIndex;

/// Pulls hits from a source and resolves them one at a time
///
/// Each range is resolved against the index as it stands when
/// [`Finder::next_range`] is called, so the caller may mutate the tree
/// (through the index) between calls. Hits that start before the end of
/// the previous hit are skipped; a pass never yields overlapping ranges.
pub struct Finder<S> {
    source: S,
    floor: usize,
    exhausted: bool,
}

impl<S: MatchSource> Finder<S> {
    pub fn new(source: S) -> Self {
        Finder {
            source,
            floor: 0,
            exhausted: false,
        }
    }

    /// Next resolved range, or None once the source is exhausted
    pub fn next_range(&mut self, index: &TextIndex) -> Result<Option<Range>> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            let Some(hit) = self.source.next_hit() else {
                self.exhausted = true;
                return Ok(None);
            };
            if hit.offset < self.floor {
                tracing::trace!(
                    target: "rustymark::search",
                    offset = hit.offset,
                    len = hit.len,
                    floor = self.floor,
                    "skipping overlapping hit"
                );
                continue;
            }
            let range = resolve(index, hit)?;
            self.floor = hit.end();
            return Ok(Some(range));
        }
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
