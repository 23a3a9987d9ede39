//! Text Index
//!
//! Builds the flattened text and marker array for a subtree, resolves
//! offsets to markers by binary search, and splits text nodes without
//! disturbing the offsets of anything outside the split node.

use super::marker::Marker;
use crate::config::{contains_tag, Config};
use crate::dom::{Document, NodeId, DOCUMENT_NODE};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// Flattened text plus offset-to-node markers for one root
#[derive(Debug, Clone)]
pub struct TextIndex {
    root: NodeId,
    text: Arc<str>,
    markers: Vec<Marker>,
    hidden_tags: HashSet<String>,
    consistency_checks: bool,
}

impl TextIndex {
    /// Create an empty index; call [`TextIndex::parse`] to populate it
    pub fn new(config: &Config) -> Self {
        TextIndex {
            root: DOCUMENT_NODE,
            text: Arc::from(""),
            markers: Vec::new(),
            hidden_tags: config.hidden_tags.clone(),
            consistency_checks: config.consistency_checks,
        }
    }

    /// Rebuild the flattened text and markers from scratch
    ///
    /// Empty text nodes are skipped so no two markers share an offset.
    pub fn parse(&mut self, doc: &Document, root: NodeId) -> Result<()> {
        if doc.get_node(root).is_none() {
            return Err(Error::UnknownNode(root));
        }

        let mut text = String::new();
        let mut markers = Vec::new();

        // (node, masked) pairs in pre-order
        let mut stack: Vec<(NodeId, bool)> = vec![(root, self.has_hidden_ancestor(doc, root))];
        while let Some((id, masked)) = stack.pop() {
            let Some(node) = doc.get_node(id) else {
                continue;
            };

            if node.is_text() {
                let content = doc.text_content(id).unwrap_or_default();
                if !content.is_empty() {
                    markers.push(Marker::new(id, text.len()));
                    if masked {
                        text.extend(std::iter::repeat(' ').take(content.len()));
                    } else {
                        text.push_str(content);
                    }
                }
                continue;
            }

            let masked = masked
                || (node.is_element()
                    && doc
                        .node_name(id)
                        .is_some_and(|name| contains_tag(&self.hidden_tags, name)));
            let mut child = node.last_child;
            while let Some(cid) = child {
                stack.push((cid, masked));
                child = doc.prev_sibling(cid);
            }
        }

        self.root = root;
        self.text = Arc::from(text);
        self.markers = markers;

        tracing::debug!(
            target: "rustymark::index",
            root,
            markers = self.markers.len(),
            text_len = self.text.len(),
            "text index rebuilt"
        );

        if self.consistency_checks {
            self.check_contiguity(doc)?;
        }
        Ok(())
    }

    fn has_hidden_ancestor(&self, doc: &Document, id: NodeId) -> bool {
        let mut current = doc.parent(id);
        while let Some(node) = current {
            if doc
                .node_name(node)
                .is_some_and(|name| contains_tag(&self.hidden_tags, name))
            {
                return true;
            }
            current = doc.parent(node);
        }
        false
    }

    /// Root the index was built from
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The flattened text
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Shared handle to the flattened text, valid for a whole search pass
    #[inline]
    pub fn snapshot(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// Byte length of the flattened text
    #[inline]
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// Number of markers
    #[inline]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// All markers, sorted by offset
    #[inline]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Index of the marker whose node contains `offset`
    pub fn index_of(&self, offset: usize) -> Result<usize> {
        if offset >= self.text.len() {
            return Err(Error::OffsetOutOfRange {
                offset,
                len: self.text.len(),
            });
        }
        // First marker starts at 0, so the partition point is at least 1
        Ok(self.markers.partition_point(|m| m.offset <= offset) - 1)
    }

    /// Marker at `index`
    pub fn at(&self, index: usize) -> Result<Marker> {
        self.markers
            .get(index)
            .copied()
            .ok_or(Error::MarkerOutOfBounds {
                index,
                len: self.markers.len(),
            })
    }

    /// Slice of the flattened text
    pub fn substr(&self, offset: usize, len: usize) -> Result<&str> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.text.len())
            .ok_or(Error::SubstrOutOfRange {
                offset,
                len,
                text_len: self.text.len(),
            })?;
        for at in [offset, end] {
            if !self.text.is_char_boundary(at) {
                return Err(Error::NotCharBoundary(at));
            }
        }
        Ok(&self.text[offset..end])
    }

    /// Position of the marker for `node`, scanning forward from `from`
    pub fn find(&self, node: NodeId, from: usize) -> Option<usize> {
        self.markers
            .iter()
            .skip(from)
            .position(|m| m.node == node)
            .map(|i| from + i)
    }

    /// Byte length of the span covered by marker `index`
    pub fn span_len(&self, index: usize) -> Result<usize> {
        let marker = self.at(index)?;
        let end = self
            .markers
            .get(index + 1)
            .map_or(self.text.len(), |next| next.offset);
        Ok(end - marker.offset)
    }

    /// Whether marker `index` maps text under a hidden element
    pub fn is_masked(&self, doc: &Document, index: usize) -> Result<bool> {
        let marker = self.at(index)?;
        Ok(self.has_hidden_ancestor(doc, marker.node))
    }

    /// Split the node of marker `index` so that its bytes `start..=end`
    /// occupy a node of their own; returns the marker index of that node
    ///
    /// Up to two new sibling nodes take the text before and after the
    /// isolated part. Offsets of every other marker are unchanged. All
    /// bounds are validated before the tree is touched, and the original
    /// node is detached only after its replacements are linked in.
    pub fn truncate(
        &mut self,
        doc: &mut Document,
        index: usize,
        start: usize,
        end: usize,
    ) -> Result<usize> {
        let marker = self.at(index)?;
        let node = doc.get_node(marker.node).ok_or(Error::UnknownNode(marker.node))?;
        if !node.is_text() {
            return Err(Error::NotTextNode(marker.node));
        }
        let kind = node.kind;
        doc.parent(marker.node).ok_or(Error::Detached(marker.node))?;

        let content = doc.text_content(marker.node).unwrap_or_default();
        let len = content.len();
        if self.consistency_checks && Some(len) != self.span_len(index).ok() {
            return Err(Error::StaleMarker {
                index,
                node: marker.node,
            });
        }
        if start > end || end >= len {
            return Err(Error::InvalidTruncation { start, end, len });
        }
        for at in [start, end + 1] {
            if !content.is_char_boundary(at) {
                return Err(Error::NotCharBoundary(marker.offset + at));
            }
        }

        let head = content[..start].to_owned();
        let middle = content[start..=end].to_owned();
        let tail = content[end + 1..].to_owned();

        let mut current = index;

        if !head.is_empty() {
            let head_node = doc.create_character_data(kind, &head);
            doc.insert_before(marker.node, head_node)?;
            self.markers.insert(current, Marker::new(head_node, marker.offset));
            current += 1;
        }

        let middle_node = doc.create_character_data(kind, &middle);
        doc.insert_before(marker.node, middle_node)?;
        self.markers[current] = Marker::new(middle_node, marker.offset + start);

        if !tail.is_empty() {
            let tail_node = doc.create_character_data(kind, &tail);
            doc.insert_after(middle_node, tail_node)?;
            self.markers
                .insert(current + 1, Marker::new(tail_node, marker.offset + end + 1));
        }

        doc.detach(marker.node)?;

        tracing::trace!(
            target: "rustymark::index",
            index,
            start,
            end,
            isolated = current,
            markers = self.markers.len(),
            "truncated text node"
        );

        if self.consistency_checks {
            self.check_contiguity(doc)?;
        }
        Ok(current)
    }

    /// Verify markers are sorted, contiguous, attached, and cover the text
    pub fn check_contiguity(&self, doc: &Document) -> Result<()> {
        let mut expected = 0;
        for (index, marker) in self.markers.iter().enumerate() {
            if marker.offset != expected {
                return Err(Error::Discontiguous {
                    index,
                    expected,
                    found: marker.offset,
                });
            }
            let len = match doc.text_len(marker.node) {
                Some(len) if doc.contains(self.root, marker.node) => len,
                _ => {
                    return Err(Error::StaleMarker {
                        index,
                        node: marker.node,
                    })
                }
            };
            expected += len;
        }

        if expected != self.text.len() {
            return Err(Error::CoverageMismatch {
                text_len: self.text.len(),
                covered: expected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn build(input: &str) -> (Document, TextIndex) {
        let doc = Document::parse(input.as_bytes());
        let mut index = TextIndex::new(&Config::default().with_consistency_checks(true));
        let root = doc.root_element_id().unwrap();
        index.parse(&doc, root).unwrap();
        (doc, index)
    }

    fn marker_texts(doc: &Document, index: &TextIndex) -> Vec<String> {
        index
            .markers()
            .iter()
            .map(|m| doc.text_content(m.node).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_parse_flattens_in_order() {
        let (doc, index) = build("<div>ab<p>cd<b>e</b></p>f</div>");
        assert_eq!(index.text(), "abcdef");
        assert_eq!(marker_texts(&doc, &index), vec!["ab", "cd", "e", "f"]);
        let offsets: Vec<_> = index.markers().iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![0, 2, 4, 5]);
    }

    #[test]
    fn test_hidden_text_is_masked() {
        let (doc, index) = build("<div>Hello <script>x();</script>world</div>");
        assert_eq!(index.text(), "Hello     world");
        assert_eq!(index.len(), 3);
        assert!(index.is_masked(&doc, 1).unwrap());
        assert!(!index.is_masked(&doc, 0).unwrap());
    }

    #[test]
    fn test_nested_hidden_content_is_masked() {
        let (_, index) = build("<div>a<noscript><p>bc</p></noscript>d</div>");
        assert_eq!(index.text(), "a  d");
    }

    #[test]
    fn test_empty_text_nodes_skipped() {
        let mut doc = Document::parse(b"<div>a</div>");
        let div = doc.root_element_id().unwrap();
        let empty = doc.create_text("");
        doc.append_child(div, empty).unwrap();
        let mut index = TextIndex::new(&Config::default());
        index.parse(&doc, div).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_index_of_bounds() {
        let (_, index) = build("<div>ab<i>cd</i></div>");
        assert_eq!(index.index_of(0), Ok(0));
        assert_eq!(index.index_of(1), Ok(0));
        assert_eq!(index.index_of(2), Ok(1));
        assert_eq!(index.index_of(3), Ok(1));
        assert_eq!(
            index.index_of(4),
            Err(Error::OffsetOutOfRange { offset: 4, len: 4 })
        );
    }

    #[test]
    fn test_accessors() {
        let (doc, index) = build("<div>héllo<i>wörld</i></div>");
        assert_eq!(index.substr(0, 6), Ok("héllo"));
        assert_eq!(index.substr(2, 1), Err(Error::NotCharBoundary(2)));
        assert!(matches!(
            index.substr(10, 10),
            Err(Error::SubstrOutOfRange { .. })
        ));
        assert_eq!(index.span_len(1), Ok("wörld".len()));
        let second = index.at(1).unwrap().node;
        assert_eq!(index.find(second, 0), Some(1));
        assert_eq!(index.find(second, 2), None);
        assert!(matches!(index.at(2), Err(Error::MarkerOutOfBounds { .. })));
        assert_eq!(doc.text_content(second), Some("wörld"));
    }

    #[test]
    fn test_truncate_three_way() {
        let (mut doc, mut index) = build("<div>abcdef</div>");
        let isolated = index.truncate(&mut doc, 0, 2, 3).unwrap();
        assert_eq!(isolated, 1);
        assert_eq!(marker_texts(&doc, &index), vec!["ab", "cd", "ef"]);
        let offsets: Vec<_> = index.markers().iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![0, 2, 4]);
        let div = doc.root_element_id().unwrap();
        assert_eq!(doc.children(div).count(), 3);
        assert_eq!(index.text(), "abcdef");
    }

    #[test]
    fn test_truncate_prefix_and_suffix() {
        let (mut doc, mut index) = build("<div>abcdef</div>");
        assert_eq!(index.truncate(&mut doc, 0, 0, 1).unwrap(), 0);
        assert_eq!(marker_texts(&doc, &index), vec!["ab", "cdef"]);
        assert_eq!(index.truncate(&mut doc, 1, 2, 3).unwrap(), 2);
        assert_eq!(marker_texts(&doc, &index), vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn test_truncate_whole_node_replaces_it() {
        let (mut doc, mut index) = build("<div>abc</div>");
        let original = index.at(0).unwrap().node;
        assert_eq!(index.truncate(&mut doc, 0, 0, 2).unwrap(), 0);
        assert_ne!(index.at(0).unwrap().node, original);
        assert!(!doc.is_attached(original));
    }

    #[test]
    fn test_truncate_validation_leaves_tree_untouched() {
        let (mut doc, mut index) = build("<div>abc</div>");
        let before = index.markers().to_vec();
        assert_eq!(
            index.truncate(&mut doc, 0, 2, 1),
            Err(Error::InvalidTruncation { start: 2, end: 1, len: 3 })
        );
        assert_eq!(
            index.truncate(&mut doc, 0, 0, 3),
            Err(Error::InvalidTruncation { start: 0, end: 3, len: 3 })
        );
        assert!(matches!(
            index.truncate(&mut doc, 5, 0, 0),
            Err(Error::MarkerOutOfBounds { .. })
        ));
        assert_eq!(index.markers(), before.as_slice());
        let div = doc.root_element_id().unwrap();
        assert_eq!(doc.children(div).count(), 1);
    }

    #[test]
    fn test_truncate_rejects_split_inside_char() {
        let (mut doc, mut index) = build("<div>aéb</div>");
        assert_eq!(
            index.truncate(&mut doc, 0, 1, 1),
            Err(Error::NotCharBoundary(2))
        );
        assert_eq!(index.truncate(&mut doc, 0, 1, 2), Ok(1));
    }

    #[test]
    fn test_external_mutation_detected() {
        let (mut doc, index) = build("<div>abc</div>");
        let node = index.at(0).unwrap().node;
        doc.set_text(node, "abcd").unwrap();
        assert_eq!(
            index.check_contiguity(&doc),
            Err(Error::CoverageMismatch { text_len: 3, covered: 4 })
        );
    }

    fn segments() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z ]{1,12}", 1..8)
    }

    fn build_from_segments(segments: &[String]) -> (Document, TextIndex) {
        let body: String = segments.iter().map(|s| format!("<span>{}</span>", s)).collect();
        build(&format!("<div>{}</div>", body))
    }

    proptest! {
        #[test]
        fn prop_truncation_preserves_invariants(
            segments in segments(),
            cuts in prop::collection::vec((0usize..64, 0usize..16, 0usize..16), 0..12)
        ) {
            let (mut doc, mut index) = build_from_segments(&segments);
            let total = index.text_len();

            for (pick, a, b) in cuts {
                let i = pick % index.len();
                let len = index.span_len(i).unwrap();
                let (start, end) = {
                    let (x, y) = (a % len, b % len);
                    (x.min(y), x.max(y))
                };
                let isolated = index.truncate(&mut doc, i, start, end).unwrap();

                prop_assert_eq!(index.span_len(isolated).unwrap(), end - start + 1);
                prop_assert!(index.check_contiguity(&doc).is_ok());
                let covered: usize = index
                    .markers()
                    .iter()
                    .map(|m| doc.text_len(m.node).unwrap())
                    .sum();
                prop_assert_eq!(covered, total);
            }

            let root = index.root();
            prop_assert_eq!(doc.text(root), segments.concat());
        }

        #[test]
        fn prop_index_of_round_trip(segments in segments()) {
            let (doc, index) = build_from_segments(&segments);
            for offset in 0..index.text_len() {
                let i = index.index_of(offset).unwrap();
                let marker = index.at(i).unwrap();
                let len = doc.text_len(marker.node).unwrap();
                prop_assert!(marker.offset <= offset && offset < marker.offset + len);
            }
        }
    }
}
