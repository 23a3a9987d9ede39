//! Search patterns and the compiled-pattern cache
//!
//! Plain literals search with memchr's `memmem`. Anything needing case
//! folding, whitespace tolerance or regex syntax is compiled once and
//! kept in an LRU cache keyed by the final regex source.

use super::sources::{LiteralSource, RegexSource};
use super::MatchSource;
use crate::error::Result;
use lru::LruCache;
use regex::{Regex, RegexBuilder};
use std::num::NonZeroUsize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Match the source text exactly
    Literal,
    /// Source is regex syntax
    Regex,
}

/// A search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub source: String,
    pub kind: PatternKind,
    pub case_insensitive: bool,
    /// For literals: any whitespace run matches any non-empty whitespace run
    pub whitespace_tolerant: bool,
}

impl Pattern {
    pub fn literal(source: impl Into<String>) -> Self {
        Pattern {
            source: source.into(),
            kind: PatternKind::Literal,
            case_insensitive: false,
            whitespace_tolerant: false,
        }
    }

    pub fn regex(source: impl Into<String>) -> Self {
        Pattern {
            kind: PatternKind::Regex,
            ..Self::literal(source)
        }
    }

    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    pub fn whitespace_tolerant(mut self, yes: bool) -> Self {
        self.whitespace_tolerant = yes;
        self
    }

    /// Whether this pattern can use the plain substring searcher
    pub fn is_plain_literal(&self) -> bool {
        self.kind == PatternKind::Literal && !self.case_insensitive && !self.whitespace_tolerant
    }

    /// Regex source text this pattern compiles to
    pub fn regex_source(&self) -> String {
        match self.kind {
            PatternKind::Regex => self.source.clone(),
            PatternKind::Literal if self.whitespace_tolerant => {
                // Every whitespace run, leading and trailing ones included, becomes \s+
                let mut out = String::with_capacity(self.source.len() + 8);
                let mut rest = self.source.as_str();
                while let Some(ch) = rest.chars().next() {
                    if ch.is_whitespace() {
                        rest = rest.trim_start();
                        out.push_str(r"\s+");
                    } else {
                        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                        out.push_str(&regex::escape(&rest[..end]));
                        rest = &rest[end..];
                    }
                }
                out
            }
            PatternKind::Literal => regex::escape(&self.source),
        }
    }

    /// Build a match source over a text snapshot
    pub fn source_over(
        &self,
        text: Arc<str>,
        cache: &mut PatternCache,
    ) -> Result<Box<dyn MatchSource + Send>> {
        if self.is_plain_literal() {
            return Ok(Box::new(LiteralSource::new(text, &self.source)));
        }
        let regex = cache.get_or_compile(self)?;
        Ok(Box::new(RegexSource::new(text, regex)))
    }
}

/// LRU cache of compiled patterns
pub struct PatternCache {
    cache: LruCache<(String, bool), Arc<Regex>>,
}

impl PatternCache {
    /// Create a cache holding at most `capacity` patterns (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        PatternCache {
            cache: LruCache::new(capacity),
        }
    }

    /// Compiled regex for a pattern, compiling on a miss
    pub fn get_or_compile(&mut self, pattern: &Pattern) -> Result<Arc<Regex>> {
        let key = (pattern.regex_source(), pattern.case_insensitive);
        if let Some(regex) = self.cache.get(&key) {
            return Ok(Arc::clone(regex));
        }

        let regex = Arc::new(
            RegexBuilder::new(&key.0)
                .case_insensitive(pattern.case_insensitive)
                .build()?,
        );
        tracing::trace!(target: "rustymark::search", pattern = %key.0, "compiled pattern");
        self.cache.put(key, Arc::clone(&regex));
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl std::fmt::Debug for PatternCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternCache")
            .field("len", &self.cache.len())
            .field("cap", &self.cache.cap())
            .finish()
    }
}
