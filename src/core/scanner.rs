//! SIMD-accelerated markup scanning using memchr
//!
//! Uses memchr crate for fast byte searching with SIMD acceleration:
//! - SSE2 (default x86_64)
//! - AVX2 (runtime detection)
//! - NEON (aarch64)
//!
//! The scanner works over `&str`; every delimiter it searches for is ASCII,
//! so positions it returns always fall on character boundaries.

use memchr::{memchr, memchr_iter, memmem};

/// Scanner for markup delimiter detection
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Set the current position
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Length of the whole input
    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// Get a slice from start to end positions
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Byte at an absolute position
    #[inline]
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        self.input.as_bytes().get(pos).copied()
    }

    /// Peek at byte at offset from current position
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Check if input starts with a sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &str) -> bool {
        self.input.as_bytes()[self.pos..].starts_with(needle.as_bytes())
    }

    /// Case-insensitive (ASCII) prefix check at current position
    #[inline]
    pub fn starts_with_ignore_case(&self, needle: &str) -> bool {
        let rest = &self.input.as_bytes()[self.pos..];
        rest.len() >= needle.len() && rest[..needle.len()].eq_ignore_ascii_case(needle.as_bytes())
    }

    /// Find next occurrence of a specific byte
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input.as_bytes()[self.pos..]).map(|i| self.pos + i)
    }

    /// Find next occurrence of a sequence starting at `from`
    #[inline]
    pub fn find_str_from(&self, from: usize, needle: &str) -> Option<usize> {
        memmem::find(&self.input.as_bytes()[from..], needle.as_bytes()).map(|i| from + i)
    }

    /// Find the next '<' that opens real markup (a tag, end tag, comment,
    /// declaration or PI). A lone '<' followed by anything else is text.
    pub fn find_markup_start(&self, from: usize) -> Option<usize> {
        let bytes = self.input.as_bytes();
        memchr_iter(b'<', &bytes[from..])
            .map(|i| from + i)
            .find(|&at| match bytes.get(at + 1) {
                Some(b'/') => bytes.get(at + 2).is_some_and(|b| b.is_ascii_alphabetic()),
                Some(b'!') | Some(b'?') => true,
                Some(b) => b.is_ascii_alphabetic(),
                None => false,
            })
    }

    /// Find the end tag `</name` for a raw-text element, ASCII case-insensitively
    pub fn find_closing_tag(&self, name: &str) -> Option<usize> {
        let bytes = self.input.as_bytes();
        memmem::find_iter(&bytes[self.pos..], b"</")
            .map(|i| self.pos + i)
            .find(|&at| {
                let start = at + 2;
                let end = start + name.len();
                end <= bytes.len()
                    && bytes[start..end].eq_ignore_ascii_case(name.as_bytes())
                    && bytes
                        .get(end)
                        .map_or(true, |&b| b == b'>' || b == b'/' || b.is_ascii_whitespace())
            })
    }

    /// Find tag end while handling quotes properly
    /// Returns the position of '>' that is not inside quotes
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let mut pos = self.pos;
        let mut in_single_quote = false;
        let mut in_double_quote = false;

        while pos < bytes.len() {
            match bytes[pos] {
                b'"' if !in_single_quote => in_double_quote = !in_double_quote,
                b'\'' if !in_double_quote => in_single_quote = !in_single_quote,
                b'>' if !in_single_quote && !in_double_quote => return Some(pos),
                _ => {}
            }
            pos += 1;
        }
        None
    }
}

/// Check if byte may continue a tag name
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_markup_start_skips_lone_lt() {
        let scanner = Scanner::new("a < b <em>");
        assert_eq!(scanner.find_markup_start(0), Some(6));
    }

    #[test]
    fn test_find_tag_end_quoted() {
        let scanner = Scanner::new("<a attr=\">test\">content");
        assert_eq!(scanner.find_tag_end_quoted(), Some(15));
    }

    #[test]
    fn test_find_closing_tag_case_insensitive() {
        let scanner = Scanner::new("if (a</b) {}</SCRIPT>");
        assert_eq!(scanner.find_closing_tag("script"), Some(12));
    }

    #[test]
    fn test_starts_with_ignore_case() {
        let scanner = Scanner::new("<!DocType html>");
        assert!(scanner.starts_with_ignore_case("<!doctype"));
        assert!(!scanner.starts_with("<!doctype"));
    }
}
