//! Match Sources and Range Resolution
//!
//! A match source yields raw hits as `(offset, len)` byte spans over a
//! snapshot of the flattened text. The [`Finder`] pulls hits one at a time
//! and resolves each against the current [`TextIndex`](crate::index::TextIndex)
//! into a marker-relative [`Range`].
//!
//! Sources are forward-only and not restartable: searching again means
//! building a new source over a fresh snapshot.

pub mod finder;
pub mod parallel;
pub mod pattern;
pub mod range;
pub mod sources;

pub use finder::Finder;
pub use parallel::scan_parallel;
pub use pattern::{Pattern, PatternCache, PatternKind};
pub use range::{resolve, Range, RangeDescriptor};
pub use sources::{HitList, LiteralSource, RegexSource};

/// A raw hit in the flattened text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hit {
    /// Byte offset of the first matched byte
    pub offset: usize,
    /// Byte length of the match
    pub len: usize,
}

impl Hit {
    #[inline]
    pub fn new(offset: usize, len: usize) -> Self {
        Hit { offset, len }
    }

    /// One past the last matched byte
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Producer of raw hits in increasing offset order
pub trait MatchSource {
    /// Next hit, or None once exhausted
    fn next_hit(&mut self) -> Option<Hit>;
}

impl<S: MatchSource + ?Sized> MatchSource for Box<S> {
    fn next_hit(&mut self) -> Option<Hit> {
        (**self).next_hit()
    }
}
