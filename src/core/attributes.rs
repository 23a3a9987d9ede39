//! Attribute Parsing
//!
//! Parses attributes from the inside of a start tag. Lenient HTML rules:
//! double-quoted, single-quoted, unquoted and valueless (boolean) forms
//! are all accepted; values are entity-decoded.

use super::entities::decode_text;
use std::borrow::Cow;

/// A parsed attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name as written
    pub name: Cow<'a, str>,
    /// Attribute value (entities decoded, empty for boolean attributes)
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: &'a str, value: Cow<'a, str>) -> Self {
        Attribute {
            name: Cow::Borrowed(name),
            value,
        }
    }
}

#[inline]
fn is_attr_name_byte(b: u8) -> bool {
    !matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C' | b'=' | b'>' | b'/' | b'"' | b'\'')
}

/// Parse all attributes in a tag's attribute region
///
/// `content` is the text between the tag name and the closing `>` / `/>`.
pub fn parse_attributes(content: &str) -> Vec<Attribute<'_>> {
    let bytes = content.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        // Skip whitespace and stray slashes
        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'/') {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        let name_start = pos;
        while pos < bytes.len() && is_attr_name_byte(bytes[pos]) {
            pos += 1;
        }
        if pos == name_start {
            // Unexpected quote or '='; skip it
            pos += 1;
            continue;
        }
        let name = &content[name_start..pos];

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        if pos >= bytes.len() || bytes[pos] != b'=' {
            attrs.push(Attribute::new(name, Cow::Borrowed("")));
            continue;
        }
        pos += 1;

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let value = match bytes.get(pos) {
            Some(&quote @ (b'"' | b'\'')) => {
                let value_start = pos + 1;
                let value_end = memchr::memchr(quote, &bytes[value_start..])
                    .map_or(bytes.len(), |i| value_start + i);
                pos = (value_end + 1).min(bytes.len());
                &content[value_start..value_end]
            }
            Some(_) => {
                let value_start = pos;
                while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                &content[value_start..pos]
            }
            None => "",
        };

        attrs.push(Attribute::new(name, decode_text(value)));
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(content: &str) -> Vec<(String, String)> {
        parse_attributes(content)
            .into_iter()
            .map(|a| (a.name.into_owned(), a.value.into_owned()))
            .collect()
    }

    #[test]
    fn test_quoted() {
        assert_eq!(
            pairs(r#" id="main" class='a b'"#),
            vec![
                ("id".to_string(), "main".to_string()),
                ("class".to_string(), "a b".to_string())
            ]
        );
    }

    #[test]
    fn test_unquoted_and_boolean() {
        assert_eq!(
            pairs(" checked width=10 disabled"),
            vec![
                ("checked".to_string(), String::new()),
                ("width".to_string(), "10".to_string()),
                ("disabled".to_string(), String::new())
            ]
        );
    }

    #[test]
    fn test_entity_in_value() {
        assert_eq!(
            pairs(r#" title="a &amp; b""#),
            vec![("title".to_string(), "a & b".to_string())]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            pairs(r#" title="open"#),
            vec![("title".to_string(), "open".to_string())]
        );
    }
}
