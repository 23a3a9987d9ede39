//! Markup Event Types
//!
//! Event types for pull-parser style markup processing.

use crate::core::attributes::Attribute;
use std::borrow::Cow;

/// Markup parsing event
#[derive(Debug, Clone)]
pub enum MarkupEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Element without content: <name attrs.../> or a void element
    EmptyElement(StartElement<'a>),
    /// Text content between tags (entities decoded unless raw text)
    Text(Cow<'a, str>),
    /// CDATA section content
    CData(Cow<'a, str>),
    /// Comment content
    Comment(Cow<'a, str>),
    /// Processing instruction: <?target data?>
    ProcessingInstruction {
        target: Cow<'a, str>,
        data: Cow<'a, str>,
    },
    /// Declaration such as DOCTYPE, without the surrounding `<!` and `>`
    DocType(Cow<'a, str>),
}

/// Start element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Element name as written
    pub name: Cow<'a, str>,
    /// Element attributes
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a str, attributes: Vec<Attribute<'a>>) -> Self {
        StartElement {
            name: Cow::Borrowed(name),
            attributes,
        }
    }

    /// Get an attribute value by name (ASCII case-insensitive)
    pub fn get_attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_ref())
    }
}

/// End element event data
#[derive(Debug, Clone)]
pub struct EndElement<'a> {
    /// Element name as written
    pub name: Cow<'a, str>,
}

impl<'a> EndElement<'a> {
    pub fn new(name: &'a str) -> Self {
        EndElement {
            name: Cow::Borrowed(name),
        }
    }
}
