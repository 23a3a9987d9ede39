//! Built-in match sources

use super::{Hit, MatchSource};
use memchr::memmem;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Pre-computed hits, yielded in the order given
#[derive(Debug, Clone, Default)]
pub struct HitList {
    hits: VecDeque<Hit>,
}

impl HitList {
    pub fn new(hits: Vec<Hit>) -> Self {
        HitList { hits: hits.into() }
    }

    /// Build from hits in any order
    pub fn sorted(mut hits: Vec<Hit>) -> Self {
        hits.sort_unstable();
        Self::new(hits)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl From<Vec<Hit>> for HitList {
    fn from(hits: Vec<Hit>) -> Self {
        Self::new(hits)
    }
}

impl MatchSource for HitList {
    fn next_hit(&mut self) -> Option<Hit> {
        self.hits.pop_front()
    }
}

/// Exact, case-sensitive substring search (memchr `memmem`)
pub struct LiteralSource {
    text: Arc<str>,
    finder: memmem::Finder<'static>,
    pos: usize,
}

impl LiteralSource {
    pub fn new(text: Arc<str>, needle: &str) -> Self {
        LiteralSource {
            text,
            finder: memmem::Finder::new(needle.as_bytes()).into_owned(),
            pos: 0,
        }
    }
}

impl MatchSource for LiteralSource {
    fn next_hit(&mut self) -> Option<Hit> {
        let needle_len = self.finder.needle().len();
        if needle_len == 0 || self.pos >= self.text.len() {
            return None;
        }
        let at = self.pos + self.finder.find(&self.text.as_bytes()[self.pos..])?;
        self.pos = at + needle_len;
        Some(Hit::new(at, needle_len))
    }
}

/// Regular-expression search; empty matches are skipped
pub struct RegexSource {
    text: Arc<str>,
    regex: Arc<Regex>,
    pos: usize,
}

impl RegexSource {
    pub fn new(text: Arc<str>, regex: Arc<Regex>) -> Self {
        RegexSource { text, regex, pos: 0 }
    }
}

impl MatchSource for RegexSource {
    fn next_hit(&mut self) -> Option<Hit> {
        while self.pos <= self.text.len() {
            let (start, end) = {
                let m = self.regex.find_at(&self.text, self.pos)?;
                (m.start(), m.end())
            };
            if end > start {
                self.pos = end;
                return Some(Hit::new(start, end - start));
            }
            // Step past the empty match to the next character
            self.pos = self.text[start..]
                .chars()
                .next()
                .map_or(self.text.len() + 1, |c| start + c.len_utf8());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut source: impl MatchSource) -> Vec<(usize, usize)> {
        std::iter::from_fn(|| source.next_hit())
            .map(|h| (h.offset, h.len))
            .collect()
    }

    #[test]
    fn test_literal_non_overlapping() {
        let source = LiteralSource::new(Arc::from("aaaa banana"), "aa");
        assert_eq!(drain(source), vec![(0, 2), (2, 2)]);

        let source = LiteralSource::new(Arc::from("banana"), "ana");
        assert_eq!(drain(source), vec![(1, 3)]);
    }

    #[test]
    fn test_literal_empty_needle() {
        assert!(drain(LiteralSource::new(Arc::from("abc"), "")).is_empty());
    }

    #[test]
    fn test_regex_skips_empty_matches() {
        let regex = Arc::new(Regex::new("a*").unwrap());
        let source = RegexSource::new(Arc::from("baaéa"), regex);
        assert_eq!(drain(source), vec![(1, 2), (5, 1)]);
    }

    #[test]
    fn test_hit_list_sorted() {
        let list = HitList::sorted(vec![Hit::new(5, 1), Hit::new(1, 2)]);
        assert_eq!(drain(list), vec![(1, 2), (5, 1)]);
    }
}
