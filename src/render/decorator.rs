//! Decorators - visual state of wrapper elements

use crate::config::Config;
use crate::dom::{Document, NodeId};
use crate::registry::Highlight;

/// Applies visual state to wrapper elements
///
/// Purely side-effecting; nothing the renderer or cursor does depends on
/// what a decorator writes.
pub trait Decorator: Send {
    /// Style freshly created (or re-rendered) wrappers of a highlight
    fn decorate(&mut self, doc: &mut Document, elements: &[NodeId], highlight: &Highlight);

    fn set_active(&mut self, doc: &mut Document, highlight: &Highlight);

    fn set_inactive(&mut self, doc: &mut Document, highlight: &Highlight);
}

/// Decorator that writes class and query attributes
#[derive(Debug, Clone)]
pub struct ClassDecorator {
    class_name: String,
    active_class: String,
    query_attribute: String,
}

impl ClassDecorator {
    pub fn new(config: &Config) -> Self {
        ClassDecorator {
            class_name: config.class_name.clone(),
            active_class: config.active_class.clone(),
            query_attribute: config.query_attribute.clone(),
        }
    }

    fn set_class(&self, doc: &mut Document, elements: &[NodeId], class: &str) {
        for &element in elements {
            if let Err(err) = doc.set_attribute(element, "class", class) {
                tracing::warn!(target: "rustymark::render", element, %err, "cannot style wrapper");
            }
        }
    }
}

impl Default for ClassDecorator {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Decorator for ClassDecorator {
    fn decorate(&mut self, doc: &mut Document, elements: &[NodeId], highlight: &Highlight) {
        self.set_class(doc, elements, &self.class_name);
        for &element in elements {
            if let Err(err) = doc.set_attribute(element, &self.query_attribute, &highlight.query) {
                tracing::warn!(target: "rustymark::render", element, %err, "cannot tag wrapper");
            }
        }
    }

    fn set_active(&mut self, doc: &mut Document, highlight: &Highlight) {
        let class = format!("{} {}", self.class_name, self.active_class);
        self.set_class(doc, &highlight.elements, &class);
    }

    fn set_inactive(&mut self, doc: &mut Document, highlight: &Highlight) {
        self.set_class(doc, &highlight.elements, &self.class_name);
    }
}
