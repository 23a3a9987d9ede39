//! Entity Decoding and Escaping
//!
//! Decoding handles:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Common HTML named entities (&nbsp; &copy; ...)
//! - Numeric character references: &#123; &#x7B;
//!
//! Unknown entities are kept verbatim. Uses Cow for zero-copy when no
//! entities are present; escaping is the inverse used by the serializer.

use memchr::{memchr, memchr3};
use std::borrow::Cow;

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode_text(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

/// Decode all entity references in the input
fn decode_entities(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(amp_offset) = memchr(b'&', &bytes[pos..]) else {
            result.push_str(&input[pos..]);
            break;
        };
        result.push_str(&input[pos..pos + amp_offset]);
        pos += amp_offset;

        // Entities are short; don't scan the whole tail for a stray '&'
        let window_end = (pos + 33).min(bytes.len());
        let decoded = memchr(b';', &bytes[pos..window_end]).and_then(|semi| {
            decode_entity(&input[pos + 1..pos + semi]).map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                result.push(c);
                pos += semi + 1;
            }
            None => {
                result.push('&');
                pos += 1;
            }
        }
    }

    result
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        return decode_numeric_entity(numeric);
    }

    Some(match entity {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "hellip" => '\u{2026}',
        _ => return None,
    })
}

/// Decode a numeric character reference
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let codepoint = match entity.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => entity.parse::<u32>().ok()?,
    };
    char::from_u32(codepoint).filter(|&c| c != '\0')
}

/// Escape text content (&, <, >)
pub fn escape_text_to_buf(s: &str, buf: &mut String) {
    escape_to_buf(s, buf, false);
}

/// Escape an attribute value (&, <, >, ")
pub fn escape_attribute_to_buf(s: &str, buf: &mut String) {
    escape_to_buf(s, buf, true);
}

fn escape_to_buf(s: &str, buf: &mut String, quotes: bool) {
    let bytes = s.as_bytes();
    let needs_escape = memchr3(b'&', b'<', b'>', bytes).is_some()
        || (quotes && memchr(b'"', bytes).is_some());
    if !needs_escape {
        buf.push_str(s);
        return;
    }

    for c in s.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' if quotes => buf.push_str("&quot;"),
            _ => buf.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities_borrows() {
        assert!(matches!(decode_text("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_builtin_and_named() {
        assert_eq!(decode_text("a &lt;b&gt; &amp; c"), "a <b> & c");
        assert_eq!(decode_text("x&nbsp;y"), "x\u{00A0}y");
    }

    #[test]
    fn test_numeric() {
        assert_eq!(decode_text("&#65;&#x42;&#X43;"), "ABC");
    }

    #[test]
    fn test_unknown_and_unterminated_kept() {
        assert_eq!(decode_text("&bogus; & more"), "&bogus; & more");
        assert_eq!(decode_text("AT&T"), "AT&T");
    }

    #[test]
    fn test_escape() {
        let mut buf = String::new();
        escape_text_to_buf("a < b & \"c\"", &mut buf);
        assert_eq!(buf, "a &lt; b &amp; \"c\"");

        let mut buf = String::new();
        escape_attribute_to_buf("say \"hi\"", &mut buf);
        assert_eq!(buf, "say &quot;hi&quot;");
    }
}
