//! HTML serialization
//!
//! Iterative, explicit-stack serializer so deep trees cannot overflow the
//! call stack. Void elements are written without an end tag, raw-text
//! element content (`script`, `style`) is written verbatim, and all other
//! text and attribute values are escaped.

use super::document::Document;
use super::node::{NodeId, NodeKind};
use crate::core::elements::{is_raw_text_element, is_void_element};
use crate::core::entities::{escape_attribute_to_buf, escape_text_to_buf};

enum StackEntry {
    Enter(NodeId),
    Close(NodeId),
}

/// Serialize a node and its subtree
pub fn to_html(doc: &Document, node_id: NodeId) -> String {
    let mut buf = String::with_capacity(1024);
    write_node(doc, node_id, &mut buf);
    buf
}

/// Serialize only the children of a node
pub fn inner_html(doc: &Document, node_id: NodeId) -> String {
    let mut buf = String::with_capacity(1024);
    for child in doc.children(node_id) {
        write_node(doc, child, &mut buf);
    }
    buf
}

fn write_node(doc: &Document, node_id: NodeId, buf: &mut String) {
    let mut stack: Vec<StackEntry> = Vec::with_capacity(64);
    stack.push(StackEntry::Enter(node_id));

    while let Some(entry) = stack.pop() {
        let current_id = match entry {
            StackEntry::Close(id) => {
                if let Some(name) = doc.node_name(id) {
                    buf.push_str("</");
                    buf.push_str(name);
                    buf.push('>');
                }
                continue;
            }
            StackEntry::Enter(id) => id,
        };
        let Some(node) = doc.get_node(current_id) else {
            continue;
        };

        match node.kind {
            NodeKind::Element => {
                let name = doc.node_name(current_id).unwrap_or_default();
                buf.push('<');
                buf.push_str(name);
                for (attr_name, attr_value) in doc.attribute_pairs(current_id) {
                    buf.push(' ');
                    buf.push_str(attr_name);
                    buf.push_str("=\"");
                    escape_attribute_to_buf(attr_value, buf);
                    buf.push('"');
                }
                buf.push('>');

                if is_void_element(name) && !node.has_children() {
                    continue;
                }
                stack.push(StackEntry::Close(current_id));
                push_children_reversed(doc, current_id, &mut stack);
            }
            NodeKind::Text => {
                let content = doc.text_content(current_id).unwrap_or_default();
                let raw = node
                    .parent
                    .and_then(|p| doc.node_name(p))
                    .is_some_and(is_raw_text_element);
                if raw {
                    buf.push_str(content);
                } else {
                    escape_text_to_buf(content, buf);
                }
            }
            NodeKind::CData => {
                buf.push_str("<![CDATA[");
                buf.push_str(doc.text_content(current_id).unwrap_or_default());
                buf.push_str("]]>");
            }
            NodeKind::Comment => {
                buf.push_str("<!--");
                buf.push_str(doc.text_content(current_id).unwrap_or_default());
                buf.push_str("-->");
            }
            NodeKind::ProcessingInstruction => {
                buf.push_str("<?");
                buf.push_str(doc.node_name(current_id).unwrap_or_default());
                let data = doc.text_content(current_id).unwrap_or_default();
                if !data.is_empty() {
                    buf.push(' ');
                    buf.push_str(data);
                }
                buf.push_str("?>");
            }
            NodeKind::DocType => {
                buf.push_str("<!");
                buf.push_str(doc.text_content(current_id).unwrap_or_default());
                buf.push('>');
            }
            NodeKind::Document => push_children_reversed(doc, current_id, &mut stack),
        }
    }
}

// Push children in reverse via last_child/prev_sibling so they pop in order
fn push_children_reversed(doc: &Document, id: NodeId, stack: &mut Vec<StackEntry>) {
    let mut child = doc.get_node(id).and_then(|n| n.last_child);
    while let Some(cid) = child {
        stack.push(StackEntry::Enter(cid));
        child = doc.prev_sibling(cid);
    }
}
