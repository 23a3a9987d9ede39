//! Highlight Renderer
//!
//! Turns a resolved [`Range`] into wrapper elements. The start and end
//! nodes are split through the index so the wrapped text is exactly the
//! range; nodes in between are wrapped whole. Wrapping only reparents
//! text nodes, so the index stays valid afterwards.

use super::decorator::Decorator;
use crate::config::Config;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::index::{Marker, TextIndex};
use crate::matching::{Range, RangeDescriptor};
use crate::registry::{Highlight, HighlightId, Registry};

#[derive(Debug, Clone)]
pub struct Renderer {
    wrapper_tag: String,
    marker_attribute: String,
}

impl Renderer {
    pub fn new(config: &Config) -> Self {
        Renderer {
            wrapper_tag: config.wrapper_tag.clone(),
            marker_attribute: config.marker_attribute.clone(),
        }
    }

    /// Whether an element was created by a renderer with this configuration
    pub fn is_wrapper(&self, doc: &Document, id: NodeId) -> bool {
        doc.node_name(id)
            .is_some_and(|name| name.eq_ignore_ascii_case(&self.wrapper_tag))
            && doc.get_attribute(id, &self.marker_attribute).is_some()
    }

    /// Wrap the text of `range` and hand the wrappers to the decorator
    ///
    /// Text under hidden elements is never wrapped. A range made only of
    /// hidden text leaves the tree untouched and yields a highlight without
    /// elements, which the decorator never sees. Otherwise the returned
    /// highlight's range covers the isolated nodes, starting at offset 0 of
    /// the first one.
    pub fn surround(
        &self,
        doc: &mut Document,
        index: &mut TextIndex,
        range: &Range,
        id: HighlightId,
        query: &str,
        decorator: &mut dyn Decorator,
    ) -> Result<Highlight> {
        if self.only_hidden(doc, index, range)? {
            tracing::trace!(target: "rustymark::render", id = id.0, "range is hidden");
            return Ok(Highlight {
                id,
                query: query.to_string(),
                range: *range,
                elements: Vec::new(),
            });
        }

        let (first, last) = if range.is_single_node() {
            let i = locate(index, range.start.marker)?;
            let isolated = index.truncate(doc, i, range.start.offset, range.end.offset)?;
            (isolated, isolated)
        } else {
            let s = locate(index, range.start.marker)?;
            let node_end = index.span_len(s)? - 1;
            let first = index.truncate(doc, s, range.start.offset, node_end)?;
            // The start split may have shifted marker positions
            let e = locate(index, range.end.marker)?;
            let last = index.truncate(doc, e, 0, range.end.offset)?;
            (first, last)
        };

        let mut elements = Vec::with_capacity(last - first + 1);
        for i in first..=last {
            if index.is_masked(doc, i)? {
                continue;
            }
            let node = index.at(i)?.node;
            let wrapper = doc.create_element(&self.wrapper_tag);
            doc.set_attribute(wrapper, &self.marker_attribute, &id.to_string())?;
            doc.wrap(node, wrapper)?;
            elements.push(wrapper);
        }

        let end_marker = index.at(last)?;
        let highlight = Highlight {
            id,
            query: query.to_string(),
            range: Range::new(
                RangeDescriptor::new(index.at(first)?, 0),
                RangeDescriptor::new(end_marker, index.span_len(last)? - 1),
            ),
            elements,
        };

        tracing::debug!(
            target: "rustymark::render",
            id = highlight.id.0,
            query,
            wrappers = highlight.elements.len(),
            nodes = last - first + 1,
            "surrounded range"
        );

        decorator.decorate(doc, &highlight.elements, &highlight);
        Ok(highlight)
    }

    fn only_hidden(&self, doc: &Document, index: &TextIndex, range: &Range) -> Result<bool> {
        let first = locate(index, range.start.marker)?;
        let last = locate(index, range.end.marker)?;
        for i in first..=last {
            if !index.is_masked(doc, i)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Re-apply decoration without re-wrapping
    pub fn decorate(&self, doc: &mut Document, highlight: &Highlight, decorator: &mut dyn Decorator) {
        decorator.decorate(doc, &highlight.elements, highlight);
    }

    /// Replace a highlight's wrappers with their contents
    ///
    /// Wrappers already removed from the tree are skipped. The caller must
    /// rebuild the index afterwards.
    pub fn unwrap(&self, doc: &mut Document, highlight: &Highlight) -> Result<()> {
        for &element in &highlight.elements {
            if doc.parent(element).is_some() {
                doc.unwrap(element)?;
            }
        }
        Ok(())
    }

    /// Wrappers under `root` that no registered highlight lists
    pub fn orphaned_wrappers(&self, doc: &Document, root: NodeId, registry: &Registry) -> Vec<NodeId> {
        doc.descendants(root)
            .filter(|&id| self.is_wrapper(doc, id))
            .filter(|&id| {
                doc.get_attribute(id, &self.marker_attribute)
                    .and_then(|value| value.parse::<u64>().ok())
                    .and_then(|raw| registry.get(HighlightId(raw)))
                    .is_none_or(|owner| !owner.elements.contains(&id))
            })
            .collect()
    }
}

/// Current marker index of a marker resolved earlier in the same pass
fn locate(index: &TextIndex, marker: Marker) -> Result<usize> {
    let i = index.index_of(marker.offset)?;
    if index.at(i)?.node != marker.node {
        return Err(Error::StaleMarker {
            index: i,
            node: marker.node,
        });
    }
    Ok(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::to_html;
    use crate::matching::{resolve, Hit};
    use crate::render::ClassDecorator;

    struct Fixture {
        doc: Document,
        index: TextIndex,
        renderer: Renderer,
        decorator: CountingDecorator,
    }

    #[derive(Default)]
    struct CountingDecorator {
        decorated: Vec<Vec<NodeId>>,
    }

    impl Decorator for CountingDecorator {
        fn decorate(&mut self, _: &mut Document, elements: &[NodeId], _: &Highlight) {
            self.decorated.push(elements.to_vec());
        }
        fn set_active(&mut self, _: &mut Document, _: &Highlight) {}
        fn set_inactive(&mut self, _: &mut Document, _: &Highlight) {}
    }

    fn fixture(input: &str) -> Fixture {
        let config = Config::default().with_consistency_checks(true);
        let doc = Document::parse(input.as_bytes());
        let mut index = TextIndex::new(&config);
        index.parse(&doc, doc.root_element_id().unwrap()).unwrap();
        Fixture {
            doc,
            index,
            renderer: Renderer::new(&config),
            decorator: CountingDecorator::default(),
        }
    }

    impl Fixture {
        fn surround(&mut self, offset: usize, len: usize) -> Highlight {
            let range = resolve(&self.index, Hit::new(offset, len)).unwrap();
            self.renderer
                .surround(
                    &mut self.doc,
                    &mut self.index,
                    &range,
                    HighlightId(7),
                    "q",
                    &mut self.decorator,
                )
                .unwrap()
        }

        fn html(&self) -> String {
            to_html(&self.doc, self.doc.root_element_id().unwrap())
        }
    }

    #[test]
    fn test_single_node_wrap() {
        let mut f = fixture("<p>hello world</p>");
        let highlight = f.surround(6, 5);
        assert_eq!(highlight.elements.len(), 1);
        assert_eq!(f.html(), r#"<p>hello <mark data-highlight="7">world</mark></p>"#);
        assert_eq!(highlight.range.start.offset, 0);
        assert_eq!(highlight.range.end.offset, 4);
        assert_eq!(f.decorator.decorated, vec![highlight.elements.clone()]);
        assert!(f.renderer.is_wrapper(&f.doc, highlight.elements[0]));
    }

    #[test]
    fn test_multi_node_wrap_in_document_order() {
        let mut f = fixture("<p>abc<b>def</b>ghi</p>");
        let highlight = f.surround(1, 7);
        assert_eq!(highlight.elements.len(), 3);
        assert_eq!(
            f.html(),
            concat!(
                r#"<p>a<mark data-highlight="7">bc</mark>"#,
                r#"<b><mark data-highlight="7">def</mark></b>"#,
                r#"<mark data-highlight="7">gh</mark>i</p>"#
            )
        );
        let text: String = highlight.elements.iter().map(|&e| f.doc.text(e)).collect();
        assert_eq!(text, "bcdefgh");
        assert!(f.index.check_contiguity(&f.doc).is_ok());
    }

    #[test]
    fn test_hidden_nodes_not_wrapped() {
        let mut f = fixture("<p>ab<script>x();</script>cd</p>");
        let highlight = f.surround(1, 7);
        assert_eq!(highlight.elements.len(), 2);
        assert_eq!(
            f.html(),
            concat!(
                r#"<p>a<mark data-highlight="7">b</mark>"#,
                r#"<script>x();</script>"#,
                r#"<mark data-highlight="7">cd</mark></p>"#
            )
        );
    }

    #[test]
    fn test_redecorate_keeps_wrappers() {
        let mut f = fixture("<p>hello world</p>");
        let mut decorator = ClassDecorator::default();
        let range = resolve(&f.index, Hit::new(0, 5)).unwrap();
        let highlight = f
            .renderer
            .surround(&mut f.doc, &mut f.index, &range, HighlightId(1), "q", &mut decorator)
            .unwrap();
        let before = f.html();

        f.renderer.decorate(&mut f.doc, &highlight, &mut decorator);
        assert_eq!(f.html(), before);
        let p = f.doc.root_element_id().unwrap();
        let wrappers: Vec<_> = f
            .doc
            .descendants(p)
            .filter(|&id| f.renderer.is_wrapper(&f.doc, id))
            .collect();
        assert_eq!(wrappers, highlight.elements);
    }

    #[test]
    fn test_unwrap_restores_text() {
        let mut f = fixture("<p>abc<b>def</b>ghi</p>");
        let highlight = f.surround(1, 7);
        f.renderer.unwrap(&mut f.doc, &highlight).unwrap();
        let p = f.doc.root_element_id().unwrap();
        f.doc.normalize(p);
        assert_eq!(f.html(), "<p>abc<b>def</b>ghi</p>");
    }

    #[test]
    fn test_stale_range_rejected() {
        let mut f = fixture("<p>abcdef</p>");
        let range = resolve(&f.index, Hit::new(0, 2)).unwrap();
        f.surround(0, 2);
        let err = f
            .renderer
            .surround(&mut f.doc, &mut f.index, &range, HighlightId(8), "q", &mut f.decorator)
            .unwrap_err();
        assert!(matches!(err, Error::StaleMarker { .. }));
    }

    #[test]
    fn test_hidden_only_range_leaves_tree_alone() {
        let mut f = fixture("<p>ab<script>xyz</script>cd</p>");
        let before = f.html();
        let nodes = f.doc.node_count();
        let highlight = f.surround(2, 3);
        assert!(highlight.elements.is_empty());
        assert!(f.decorator.decorated.is_empty());
        assert_eq!(f.html(), before);
        assert_eq!(f.doc.node_count(), nodes);
    }

    #[test]
    fn test_orphaned_wrappers() {
        let mut f = fixture("<p>abc def</p>");
        let kept = f.surround(0, 3);
        let mut registry = Registry::new();
        registry.insert(kept.clone());
        let range = resolve(&f.index, Hit::new(4, 3)).unwrap();
        let stray = f
            .renderer
            .surround(&mut f.doc, &mut f.index, &range, HighlightId(8), "q", &mut f.decorator)
            .unwrap();

        let p = f.doc.root_element_id().unwrap();
        assert_eq!(f.renderer.orphaned_wrappers(&f.doc, p, &registry), stray.elements);
    }
}

