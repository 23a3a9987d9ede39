//! Zero-Copy Slice Reader
//!
//! Pulls markup events from a string slice. Input references are kept
//! directly in the events wherever no entity decoding was needed.
//!
//! The reader is lenient the way browsers are: a lone `<` is text,
//! unterminated constructs run to the end of input, and raw-text elements
//! (`script`, `style`, `textarea`, `title`) swallow everything up to their
//! matching end tag.

use super::events::{EndElement, MarkupEvent, StartElement};
use crate::core::attributes::parse_attributes;
use crate::core::elements::{is_escapable_raw_text_element, is_raw_text_element, is_void_element};
use crate::core::entities::decode_text;
use crate::core::scanner::{is_name_char, Scanner};
use std::borrow::Cow;

/// Zero-copy markup reader over a string slice
pub struct SliceReader<'a> {
    scanner: Scanner<'a>,
    /// Set after a raw-text start tag; the next event is its content
    raw_text: Option<&'a str>,
}

impl<'a> SliceReader<'a> {
    /// Create a new slice reader
    pub fn new(input: &'a str) -> Self {
        SliceReader {
            scanner: Scanner::new(input),
            raw_text: None,
        }
    }

    /// Current byte position in the input
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Get the next markup event, or None at end of input
    pub fn next_event(&mut self) -> Option<MarkupEvent<'a>> {
        loop {
            if let Some(name) = self.raw_text.take() {
                if let Some(event) = self.read_raw_text(name) {
                    return Some(event);
                }
                continue;
            }

            if self.scanner.is_eof() {
                return None;
            }

            let pos = self.scanner.position();
            let markup = self.scanner.find_markup_start(pos);
            let text_end = markup.unwrap_or(self.scanner.len());
            if text_end > pos {
                self.scanner.set_position(text_end);
                return Some(MarkupEvent::Text(decode_text(self.scanner.slice(pos, text_end))));
            }

            return Some(self.read_markup());
        }
    }

    /// Read the content of a raw-text element up to its end tag
    fn read_raw_text(&mut self, name: &'a str) -> Option<MarkupEvent<'a>> {
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_closing_tag(name)
            .unwrap_or(self.scanner.len());
        self.scanner.set_position(end);
        if end == start {
            return None;
        }

        let content = self.scanner.slice(start, end);
        let text = if is_escapable_raw_text_element(name) {
            decode_text(content)
        } else {
            Cow::Borrowed(content)
        };
        Some(MarkupEvent::Text(text))
    }

    /// Read one markup construct starting at '<'
    fn read_markup(&mut self) -> MarkupEvent<'a> {
        let start = self.scanner.position();

        if self.scanner.starts_with("<!--") {
            let (content, next) = self.delimited(start + 4, "-->");
            self.scanner.set_position(next);
            return MarkupEvent::Comment(Cow::Borrowed(content));
        }

        if self.scanner.starts_with("<![CDATA[") {
            let (content, next) = self.delimited(start + 9, "]]>");
            self.scanner.set_position(next);
            return MarkupEvent::CData(Cow::Borrowed(content));
        }

        if self.scanner.starts_with("<!") {
            let (content, next) = self.delimited(start + 2, ">");
            self.scanner.set_position(next);
            return MarkupEvent::DocType(Cow::Borrowed(content));
        }

        if self.scanner.starts_with("<?") {
            let (content, next) = self.delimited(start + 2, ">");
            self.scanner.set_position(next);
            let content = content.strip_suffix('?').unwrap_or(content);
            let name_len = content.bytes().take_while(|&b| is_name_char(b)).count();
            return MarkupEvent::ProcessingInstruction {
                target: Cow::Borrowed(&content[..name_len]),
                data: Cow::Borrowed(content[name_len..].trim()),
            };
        }

        if self.scanner.starts_with("</") {
            let name_end = self.name_end(start + 2);
            let name = self.scanner.slice(start + 2, name_end);
            let (_, next) = self.delimited(name_end, ">");
            self.scanner.set_position(next);
            return MarkupEvent::EndElement(EndElement::new(name));
        }

        let name_end = self.name_end(start + 1);
        let name = self.scanner.slice(start + 1, name_end);
        self.scanner.set_position(name_end);
        let tag_end = self
            .scanner
            .find_tag_end_quoted()
            .unwrap_or(self.scanner.len());
        let attr_region = self.scanner.slice(name_end, tag_end);
        self.scanner.set_position(tag_end + 1);

        let self_closing = attr_region.trim_end().ends_with('/');
        let element = StartElement::new(name, parse_attributes(attr_region));

        if self_closing || is_void_element(name) {
            return MarkupEvent::EmptyElement(element);
        }
        if is_raw_text_element(name) || is_escapable_raw_text_element(name) {
            self.raw_text = Some(name);
        }
        MarkupEvent::StartElement(element)
    }

    /// Content from `from` up to `terminator`, and the position after it.
    /// An unterminated construct runs to the end of input.
    fn delimited(&self, from: usize, terminator: &str) -> (&'a str, usize) {
        let from = from.min(self.scanner.len());
        match self.scanner.find_str_from(from, terminator) {
            Some(end) => (self.scanner.slice(from, end), end + terminator.len()),
            None => (self.scanner.slice(from, self.scanner.len()), self.scanner.len()),
        }
    }

    /// Every non-ASCII byte is a name byte, so the end is always a char boundary
    fn name_end(&self, from: usize) -> usize {
        let mut end = from;
        while let Some(b) = self.scanner.byte_at(end) {
            if !is_name_char(b) {
                break;
            }
            end += 1;
        }
        end
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = MarkupEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(input: &str) -> Vec<String> {
        SliceReader::new(input)
            .map(|event| match event {
                MarkupEvent::StartElement(e) => format!("start:{}", e.name),
                MarkupEvent::EmptyElement(e) => format!("empty:{}", e.name),
                MarkupEvent::EndElement(e) => format!("end:{}", e.name),
                MarkupEvent::Text(t) => format!("text:{}", t),
                MarkupEvent::CData(t) => format!("cdata:{}", t),
                MarkupEvent::Comment(t) => format!("comment:{}", t),
                MarkupEvent::ProcessingInstruction { target, data } => {
                    format!("pi:{}:{}", target, data)
                }
                MarkupEvent::DocType(t) => format!("doctype:{}", t),
            })
            .collect()
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            describe("<p>Hello <b>world</b></p>"),
            vec!["start:p", "text:Hello ", "start:b", "text:world", "end:b", "end:p"]
        );
    }

    #[test]
    fn test_void_and_self_closing() {
        assert_eq!(
            describe("a<br>b<img src=x/><span/>"),
            vec!["text:a", "empty:br", "text:b", "empty:img", "empty:span"]
        );
    }

    #[test]
    fn test_script_is_raw_text() {
        assert_eq!(
            describe("<script>if (a < b && c) {}</script>"),
            vec!["start:script", "text:if (a < b && c) {}", "end:script"]
        );
    }

    #[test]
    fn test_title_decodes_entities() {
        assert_eq!(
            describe("<title>A &amp; B</title>"),
            vec!["start:title", "text:A & B", "end:title"]
        );
    }

    #[test]
    fn test_comment_doctype_cdata_pi() {
        assert_eq!(
            describe("<!DOCTYPE html><!-- note --><![CDATA[x<y]]><?xml version=\"1.0\"?>"),
            vec![
                "doctype:DOCTYPE html",
                "comment: note ",
                "cdata:x<y",
                "pi:xml:version=\"1.0\""
            ]
        );
    }

    #[test]
    fn test_lone_lt_is_text() {
        assert_eq!(describe("1 < 2"), vec!["text:1 < 2"]);
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(describe("a<!-- open"), vec!["text:a", "comment: open"]);
    }

    #[test]
    fn test_attributes_reach_event() {
        let mut reader = SliceReader::new(r#"<div id="main" class=box>"#);
        match reader.next_event() {
            Some(MarkupEvent::StartElement(e)) => {
                assert_eq!(e.get_attribute_value("ID"), Some("main"));
                assert_eq!(e.get_attribute_value("class"), Some("box"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_non_ascii_tag_names() {
        assert_eq!(
            describe("<p>caf<bé>x</bé></p>"),
            vec!["start:p", "text:caf", "start:bé", "text:x", "end:bé", "end:p"]
        );
        assert_eq!(describe("<x日本 a=1>y"), vec!["start:x日本", "text:y"]);
    }
}
