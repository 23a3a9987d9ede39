//! HTML Element Classes
//!
//! Element-name classification shared by the reader and the serializer.
//! All comparisons are ASCII case-insensitive.

/// Elements that never have content or an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is read verbatim up to the matching end tag
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Raw-text elements whose content still has entities decoded
const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

#[inline]
fn contains(list: &[&str], name: &str) -> bool {
    list.iter().any(|candidate| candidate.eq_ignore_ascii_case(name))
}

#[inline]
pub fn is_void_element(name: &str) -> bool {
    contains(VOID_ELEMENTS, name)
}

/// Content is not parsed and not escaped on output
#[inline]
pub fn is_raw_text_element(name: &str) -> bool {
    contains(RAW_TEXT_ELEMENTS, name)
}

/// Content is not parsed as markup but entities are decoded
#[inline]
pub fn is_escapable_raw_text_element(name: &str) -> bool {
    contains(ESCAPABLE_RAW_TEXT_ELEMENTS, name)
}
