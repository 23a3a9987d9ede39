//! Document - Arena-based mutable DOM
//!
//! Efficient DOM storage with:
//! - Arena allocation for nodes (slot 0 is the document node)
//! - NodeId indices for traversal, linked first/last child and siblings
//! - String interning for names, attribute values and character data
//!
//! Unlike a read-only parse tree, this document is edited in place:
//! nodes are created detached and then linked, moved, wrapped and
//! unwrapped. Detached nodes keep their arena slot for the lifetime of
//! the document, so a `NodeId` never dangles.

use super::node::{Attribute, Node, NodeId, NodeKind, DOCUMENT_NODE};
use super::strings::StringPool;
use crate::error::{Error, Result};
use crate::reader::events::{MarkupEvent, StartElement};
use crate::reader::slice::SliceReader;

/// A markup document stored in arena format
#[derive(Debug)]
pub struct Document {
    /// Arena of nodes
    nodes: Vec<Node>,
    /// Arena of attributes, one contiguous run per element
    attributes: Vec<Attribute>,
    /// Interned strings
    pub strings: StringPool,
}

impl Document {
    /// Create an empty document holding only the document node
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(Node::document());
        Document {
            nodes,
            attributes: Vec::with_capacity(128),
            strings: StringPool::new(),
        }
    }

    /// Parse a document from bytes (invalid UTF-8 is replaced, never fails)
    pub fn parse(input: &[u8]) -> Self {
        let text = String::from_utf8_lossy(input);
        Self::parse_str(&text)
    }

    /// Parse a document from a string slice
    pub fn parse_str(input: &str) -> Self {
        let mut doc = Document::new();
        doc.build_from_events(input);
        doc
    }

    /// Build the tree from reader events. Unmatched end tags are ignored;
    /// an end tag closes every element opened after its matching start tag.
    fn build_from_events(&mut self, input: &str) {
        let mut stack: Vec<NodeId> = vec![DOCUMENT_NODE];

        for event in SliceReader::new(input) {
            let parent = stack.last().copied().unwrap_or(DOCUMENT_NODE);
            match event {
                MarkupEvent::StartElement(elem) => {
                    let id = self.push_element(&elem);
                    self.link(parent, None, id);
                    stack.push(id);
                }
                MarkupEvent::EmptyElement(elem) => {
                    let id = self.push_element(&elem);
                    self.link(parent, None, id);
                }
                MarkupEvent::EndElement(end) => {
                    let open = stack.iter().rposition(|&id| {
                        id != DOCUMENT_NODE
                            && self
                                .node_name(id)
                                .is_some_and(|name| name.eq_ignore_ascii_case(&end.name))
                    });
                    if let Some(pos) = open {
                        stack.truncate(pos);
                    }
                }
                MarkupEvent::Text(content) => {
                    if !content.is_empty() {
                        let id = self.create_character_data(NodeKind::Text, &content);
                        self.link(parent, None, id);
                    }
                }
                MarkupEvent::CData(content) => {
                    let id = self.create_character_data(NodeKind::CData, &content);
                    self.link(parent, None, id);
                }
                MarkupEvent::Comment(content) => {
                    let id = self.create_character_data(NodeKind::Comment, &content);
                    self.link(parent, None, id);
                }
                MarkupEvent::DocType(content) => {
                    let id = self.create_character_data(NodeKind::DocType, &content);
                    self.link(parent, None, id);
                }
                MarkupEvent::ProcessingInstruction { target, data } => {
                    let name_id = self.strings.intern(&target);
                    let value_id = self.strings.intern(&data);
                    let id = self.push_node(Node::processing_instruction(name_id, value_id));
                    self.link(parent, None, id);
                }
            }
        }
    }

    fn push_element(&mut self, elem: &StartElement<'_>) -> NodeId {
        let name_id = self.strings.intern(&elem.name);
        let mut node = Node::element(name_id);

        node.attr_start = self.attributes.len() as u32;
        for attr in elem.attributes.iter().take(u16::MAX as usize) {
            let attr_name_id = self.strings.intern(&attr.name);
            let attr_value_id = self.strings.intern(&attr.value);
            self.attributes.push(Attribute::new(attr_name_id, attr_value_id));
        }
        node.attr_count = elem.attributes.len().min(u16::MAX as usize) as u16;

        self.push_node(node)
    }

    #[inline]
    fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id as usize).ok_or(Error::UnknownNode(id))
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let name_id = self.strings.intern(name);
        self.push_node(Node::element(name_id))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create_character_data(NodeKind::Text, text)
    }

    /// Create a detached character-data node of the given kind
    pub fn create_character_data(&mut self, kind: NodeKind, text: &str) -> NodeId {
        let value_id = self.strings.intern(text);
        self.push_node(Node::character_data(kind, value_id))
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Get the first element child of the document node
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.children(DOCUMENT_NODE)
            .find(|&id| self.nodes[id as usize].is_element())
    }

    /// Get a node by ID
    #[inline]
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Get node kind
    #[inline]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// Total number of arena slots, detached nodes included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Element name or processing-instruction target
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => self.strings.get(node.name_id),
            _ => None,
        }
    }

    /// Character data of a text, CDATA, comment, PI or doctype node
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Document | NodeKind::Element => None,
            _ => self.strings.get(node.value_id),
        }
    }

    /// Byte length of a text node's content
    pub fn text_len(&self, id: NodeId) -> Option<usize> {
        let node = self.get_node(id)?;
        if node.is_text() {
            self.strings.len_of(node.value_id)
        } else {
            None
        }
    }

    /// Check if a node is a text (or CDATA) node
    #[inline]
    pub fn is_text(&self, id: NodeId) -> bool {
        self.get_node(id).is_some_and(Node::is_text)
    }

    /// Concatenated text of a node and all its descendants
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        if self.is_text(id) {
            out.push_str(self.text_content(id).unwrap_or_default());
            return out;
        }
        for desc in self.descendants(id) {
            if self.is_text(desc) {
                out.push_str(self.text_content(desc).unwrap_or_default());
            }
        }
        out
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.parent)
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.next_sibling)
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.prev_sibling)
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants of a node in pre-order (node excluded)
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut iter = DescendantIter {
            doc: self,
            stack: Vec::new(),
        };
        iter.push_children(id);
        iter
    }

    /// Check if `id` is `ancestor` or lies inside its subtree
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Check if a node is reachable from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        (id as usize) < self.nodes.len() && self.contains(DOCUMENT_NODE, id)
    }

    // ------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insert(parent, child)?;
        self.unlink(child);
        self.link(parent, None, child);
        Ok(())
    }

    /// Insert `node` immediately before `reference`
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        let parent = self.node(reference)?.parent.ok_or(Error::Detached(reference))?;
        if reference == node {
            return Ok(());
        }
        self.check_insert(parent, node)?;
        self.unlink(node);
        self.link(parent, Some(reference), node);
        Ok(())
    }

    /// Insert `node` immediately after `reference`
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        let parent = self.node(reference)?.parent.ok_or(Error::Detached(reference))?;
        if reference == node {
            return Ok(());
        }
        self.check_insert(parent, node)?;
        self.unlink(node);
        let next = self.nodes[reference as usize].next_sibling;
        self.link(parent, next, node);
        Ok(())
    }

    /// Remove a node (with its subtree) from its parent
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        if self.node(id)?.parent.is_none() {
            return Err(Error::Detached(id));
        }
        self.unlink(id);
        Ok(())
    }

    /// Put `node` inside the detached element `wrapper`, which takes its place
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) -> Result<()> {
        if !self.node(wrapper)?.is_element() {
            return Err(Error::NotElement(wrapper));
        }
        self.insert_before(node, wrapper)?;
        self.append_child(wrapper, node)
    }

    /// Replace an element with its children
    pub fn unwrap(&mut self, element: NodeId) -> Result<()> {
        let node = self.node(element)?;
        if !node.is_element() {
            return Err(Error::NotElement(element));
        }
        let parent = node.parent.ok_or(Error::Detached(element))?;

        while let Some(child) = self.nodes[element as usize].first_child {
            self.unlink(child);
            self.link(parent, Some(element), child);
        }
        self.unlink(element);
        Ok(())
    }

    /// Replace the content of a character-data node
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        if !self.node(id)?.is_text() {
            return Err(Error::NotTextNode(id));
        }
        let value_id = self.strings.intern(text);
        self.nodes[id as usize].value_id = value_id;
        Ok(())
    }

    /// Merge adjacent text nodes and drop empty ones within a subtree
    pub fn normalize(&mut self, root: NodeId) {
        let mut containers: Vec<NodeId> = vec![root];
        containers.extend(
            self.descendants(root)
                .filter(|&id| self.nodes[id as usize].has_children()),
        );

        for container in containers {
            let mut current = self.nodes.get(container as usize).and_then(|n| n.first_child);
            while let Some(id) = current {
                let next = self.nodes[id as usize].next_sibling;
                if self.nodes[id as usize].kind == NodeKind::Text {
                    let text = self.text_content(id).unwrap_or_default();
                    let prev = self.nodes[id as usize]
                        .prev_sibling
                        .filter(|&p| self.nodes[p as usize].kind == NodeKind::Text);

                    if text.is_empty() {
                        self.unlink(id);
                    } else if let Some(prev) = prev {
                        let merged = format!("{}{}", self.text_content(prev).unwrap_or_default(), text);
                        self.nodes[prev as usize].value_id = self.strings.intern(&merged);
                        self.unlink(id);
                    }
                }
                current = next;
            }
        }
    }

    /// Rebuild the arena from the nodes reachable from the document node
    ///
    /// Detached nodes, and strings only they referenced, are dropped. The
    /// returned table maps every old id to its new id (`None` when dropped).
    /// Ids held outside the document must be remapped through it.
    pub fn compact(&mut self) -> Vec<Option<NodeId>> {
        let mut remap = vec![None; self.nodes.len()];
        remap[DOCUMENT_NODE as usize] = Some(DOCUMENT_NODE);
        let mut fresh = Document::new();

        for id in self.descendants(DOCUMENT_NODE) {
            let node = &self.nodes[id as usize];
            let Some(parent) = node.parent.and_then(|p| remap[p as usize]) else {
                continue;
            };
            let copy = Node {
                kind: node.kind,
                parent: None,
                first_child: None,
                last_child: None,
                prev_sibling: None,
                next_sibling: None,
                name_id: fresh.strings.intern(self.strings.get(node.name_id).unwrap_or_default()),
                value_id: fresh.strings.intern(self.strings.get(node.value_id).unwrap_or_default()),
                attr_start: fresh.attributes.len() as u32,
                attr_count: node.attr_count,
            };
            for attr in self.attributes(id) {
                let name_id = fresh.strings.intern(self.strings.get(attr.name_id).unwrap_or_default());
                let value_id = fresh.strings.intern(self.strings.get(attr.value_id).unwrap_or_default());
                fresh.attributes.push(Attribute::new(name_id, value_id));
            }

            let new_id = fresh.push_node(copy);
            fresh.link(parent, None, new_id);
            remap[id as usize] = Some(new_id);
        }

        tracing::debug!(
            target: "rustymark::dom",
            before = self.nodes.len(),
            after = fresh.nodes.len(),
            "compacted document"
        );
        *self = fresh;
        remap
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.node(parent)?;
        self.node(child)?;
        if !matches!(parent_node.kind, NodeKind::Element | NodeKind::Document) {
            return Err(Error::NotElement(parent));
        }
        if child == DOCUMENT_NODE || self.contains(child, parent) {
            return Err(Error::Hierarchy { parent, child });
        }
        Ok(())
    }

    /// Splice a node out of its sibling list (no-op when detached)
    fn unlink(&mut self, id: NodeId) {
        let node = &self.nodes[id as usize];
        let (Some(parent), prev, next) = (node.parent, node.prev_sibling, node.next_sibling) else {
            return;
        };

        match prev {
            Some(p) => self.nodes[p as usize].next_sibling = next,
            None => self.nodes[parent as usize].first_child = next,
        }
        match next {
            Some(n) => self.nodes[n as usize].prev_sibling = prev,
            None => self.nodes[parent as usize].last_child = prev,
        }

        let node = &mut self.nodes[id as usize];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Link a detached node under `parent`, before `before` or at the end
    fn link(&mut self, parent: NodeId, before: Option<NodeId>, child: NodeId) {
        let prev = match before {
            Some(b) => self.nodes[b as usize].prev_sibling,
            None => self.nodes[parent as usize].last_child,
        };

        let node = &mut self.nodes[child as usize];
        node.parent = Some(parent);
        node.prev_sibling = prev;
        node.next_sibling = before;

        match prev {
            Some(p) => self.nodes[p as usize].next_sibling = Some(child),
            None => self.nodes[parent as usize].first_child = Some(child),
        }
        match before {
            Some(b) => self.nodes[b as usize].prev_sibling = Some(child),
            None => self.nodes[parent as usize].last_child = Some(child),
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Get attributes for an element
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.get_node(id) {
            Some(node) => {
                let start = node.attr_start as usize;
                let end = start + node.attr_count as usize;
                self.attributes.get(start..end).unwrap_or(&[])
            }
            None => &[],
        }
    }

    /// Get attribute value by name (ASCII case-insensitive)
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attr| {
                self.strings
                    .get(attr.name_id)
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .and_then(|attr| self.strings.get(attr.value_id))
    }

    /// Get all attribute names and values for a node
    pub fn attribute_pairs(&self, id: NodeId) -> Vec<(&str, &str)> {
        self.attributes(id)
            .iter()
            .filter_map(|attr| {
                let name = self.strings.get(attr.name_id)?;
                let value = self.strings.get(attr.value_id)?;
                Some((name, value))
            })
            .collect()
    }

    fn attribute_position(&self, id: NodeId, name: &str) -> Option<usize> {
        self.attributes(id).iter().position(|attr| {
            self.strings
                .get(attr.name_id)
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    /// Set or replace an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        if !self.node(id)?.is_element() {
            return Err(Error::NotElement(id));
        }
        let value_id = self.strings.intern(value);

        if let Some(pos) = self.attribute_position(id, name) {
            let index = self.nodes[id as usize].attr_start as usize + pos;
            self.attributes[index].value_id = value_id;
            return Ok(());
        }

        let name_id = self.strings.intern(name);
        let node = &self.nodes[id as usize];
        let start = node.attr_start as usize;
        let count = node.attr_count as usize;
        if count == u16::MAX as usize {
            return Ok(());
        }

        // Runs are contiguous; grow in place only when this run is last
        if count > 0 && start + count != self.attributes.len() {
            self.attributes.extend_from_within(start..start + count);
        }
        let new_start = self.attributes.len() - count;
        self.attributes.push(Attribute::new(name_id, value_id));

        let node = &mut self.nodes[id as usize];
        node.attr_start = new_start as u32;
        node.attr_count = (count + 1) as u16;
        Ok(())
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool> {
        if !self.node(id)?.is_element() {
            return Err(Error::NotElement(id));
        }
        let Some(pos) = self.attribute_position(id, name) else {
            return Ok(false);
        };

        let node = &mut self.nodes[id as usize];
        let start = node.attr_start as usize;
        let end = start + node.attr_count as usize;
        self.attributes.copy_within(start + pos + 1..end, start + pos);
        node.attr_count -= 1;
        Ok(true)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over child nodes
pub struct ChildIter<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

/// Pre-order iterator over descendant nodes
pub struct DescendantIter<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> DescendantIter<'a> {
    fn push_children(&mut self, id: NodeId) {
        let mut child = self.doc.get_node(id).and_then(|n| n.last_child);
        while let Some(cid) = child {
            self.stack.push(cid);
            child = self.doc.prev_sibling(cid);
        }
    }
}

impl<'a> Iterator for DescendantIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.push_children(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(doc: &Document) -> NodeId {
        doc.root_element_id().unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let doc = Document::parse(b"<root>hello</root>");
        let root = root_of(&doc);
        assert_eq!(doc.node_name(root), Some("root"));
        assert_eq!(doc.text(root), "hello");
    }

    #[test]
    fn test_descendants_pre_order() {
        let doc = Document::parse(b"<root><a>1</a><b><c>2</c></b>3</root>");
        let root = root_of(&doc);
        let names: Vec<String> = doc
            .descendants(root)
            .map(|id| {
                doc.node_name(id)
                    .or_else(|| doc.text_content(id))
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(names, vec!["a", "1", "b", "c", "2", "3"]);
    }

    #[test]
    fn test_lenient_end_tags() {
        let doc = Document::parse(b"<div><p><b>x</div>y</span>");
        let root = root_of(&doc);
        assert_eq!(doc.children(root).count(), 1);
        // "y" lands after div once the end tag closed p and b as well
        let top: Vec<_> = doc.children(DOCUMENT_NODE).collect();
        assert_eq!(top.len(), 2);
        assert_eq!(doc.text_content(top[1]), Some("y"));
    }

    #[test]
    fn test_void_elements_have_no_children() {
        let doc = Document::parse(b"<p>a<br>b</p>");
        let root = root_of(&doc);
        assert_eq!(doc.children(root).count(), 3);
    }

    #[test]
    fn test_insert_and_detach() {
        let mut doc = Document::parse(b"<p>b</p>");
        let p = root_of(&doc);
        let b = doc.children(p).next().unwrap();
        let a = doc.create_text("a");
        let c = doc.create_text("c");
        doc.insert_before(b, a).unwrap();
        doc.insert_after(b, c).unwrap();
        assert_eq!(doc.text(p), "abc");

        doc.detach(b).unwrap();
        assert_eq!(doc.text(p), "ac");
        assert!(!doc.is_attached(b));
        assert_eq!(doc.detach(b), Err(Error::Detached(b)));
    }

    #[test]
    fn test_hierarchy_rejected() {
        let mut doc = Document::parse(b"<a><b></b></a>");
        let a = root_of(&doc);
        let b = doc.children(a).next().unwrap();
        assert_eq!(doc.append_child(b, a), Err(Error::Hierarchy { parent: b, child: a }));
    }

    #[test]
    fn test_wrap_unwrap_normalize() {
        let mut doc = Document::parse(b"<p>hello world</p>");
        let p = root_of(&doc);
        let text = doc.children(p).next().unwrap();
        doc.set_text(text, "world").unwrap();
        let hello = doc.create_text("hello ");
        doc.insert_before(text, hello).unwrap();

        let mark = doc.create_element("mark");
        doc.wrap(text, mark).unwrap();
        assert_eq!(doc.parent(text), Some(mark));
        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![hello, mark]);

        doc.unwrap(mark).unwrap();
        assert_eq!(doc.children(p).count(), 2);
        doc.normalize(p);
        let children: Vec<_> = doc.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.text_content(children[0]), Some("hello world"));
    }

    #[test]
    fn test_attributes_relocate() {
        let mut doc = Document::parse(br#"<div id="a"><span class="x"></span></div>"#);
        let div = root_of(&doc);
        let span = doc.children(div).next().unwrap();

        doc.set_attribute(div, "title", "t").unwrap();
        doc.set_attribute(div, "ID", "b").unwrap();
        assert_eq!(doc.attribute_pairs(div), vec![("id", "b"), ("title", "t")]);
        assert_eq!(doc.get_attribute(span, "class"), Some("x"));

        assert_eq!(doc.remove_attribute(div, "id"), Ok(true));
        assert_eq!(doc.remove_attribute(div, "id"), Ok(false));
        assert_eq!(doc.attribute_pairs(div), vec![("title", "t")]);

        let text = doc.create_text("t");
        assert_eq!(doc.set_attribute(text, "a", "b"), Err(Error::NotElement(text)));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let doc = Document::parse(b"<p>a\xFFb</p>");
        assert_eq!(doc.text(root_of(&doc)), "a\u{FFFD}b");
    }

    #[test]
    fn test_non_ascii_tag_name_parses() {
        let doc = Document::parse("<p>caf<bé>x</bé>!</p>".as_bytes());
        let p = root_of(&doc);
        assert_eq!(doc.text(p), "cafx!");
        let names: Vec<_> = doc.descendants(p).filter_map(|id| doc.node_name(id)).collect();
        assert_eq!(names, vec!["bé"]);
    }

    #[test]
    fn test_compact_drops_detached_nodes() {
        let mut doc = Document::parse(b"<p class=a>one<b>two</b></p>");
        let p = root_of(&doc);
        let b = doc.children(p).nth(1).unwrap();
        for i in 0..10 {
            let scratch = doc.create_text(&format!("scratch {i}"));
            doc.append_child(p, scratch).unwrap();
            doc.detach(scratch).unwrap();
        }
        let strings_before = doc.strings.len();

        let remap = doc.compact();
        assert_eq!(doc.node_count(), 5);
        assert!(doc.strings.len() < strings_before);

        let p = remap[p as usize].unwrap();
        let b = remap[b as usize].unwrap();
        assert_eq!(doc.get_attribute(p, "class"), Some("a"));
        assert_eq!(doc.node_name(b), Some("b"));
        assert_eq!(doc.parent(b), Some(p));
        assert_eq!(crate::dom::to_html(&doc, p), r#"<p class="a">one<b>two</b></p>"#);
    }
}
