//! Thin helpers over the html5ever / rcdom tree.
//!
//! Both the preprocessor and the parser work on an [`RcDom`]; this module keeps the
//! node-level plumbing (attribute lookup, text extraction, serialization, node building)
//! out of the conversion code.

use html5ever::tendril::TendrilSink;
use html5ever::{
    ns, parse_document, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute,
    LocalName, ParseOpts, QualName,
};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Parses a markup fragment as the body of an HTML document.
///
/// A doctype is prepended so that the only errors reported are about the markup itself.
pub fn parse_html(html: &str) -> RcDom {
    let source = format!("<!DOCTYPE html>{html}");
    parse_document(RcDom::default(), ParseOpts::default()).one(source)
}

/// Recoverable errors html5ever reported while building the tree.
pub fn parse_errors(dom: &RcDom) -> Vec<String> {
    dom.errors
        .borrow()
        .iter()
        .map(|error| error.to_string())
        .collect()
}

/// The nodes that make up the fragment, in document order.
///
/// html5ever distributes a fragment over the document, `html`, `head` and `body` depending
/// on where a node appeared; this flattens those containers back out.
pub fn top_level_nodes(dom: &RcDom) -> Vec<Handle> {
    let mut nodes = Vec::new();
    collect_top_level(&dom.document, &mut nodes);
    nodes
}

fn collect_top_level(parent: &Handle, out: &mut Vec<Handle>) {
    for child in parent.children.borrow().iter() {
        match &child.data {
            NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {}
            NodeData::Element { name, .. }
                if matches!(&*name.local, "html" | "head" | "body") =>
            {
                collect_top_level(child, out);
            }
            _ => out.push(child.clone()),
        }
    }
}

/// Local name of an element, `None` for any other node.
pub fn tag_name(node: &Node) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

pub fn is_tag(node: &Node, tag: &str) -> bool {
    tag_name(node) == Some(tag)
}

pub fn attr(node: &Node, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attribute| &*attribute.name.local == name)
            .map(|attribute| attribute.value.to_string()),
        _ => None,
    }
}

/// Attribute value with surrounding whitespace removed; empty values count as absent.
pub fn non_empty_attr(node: &Node, name: &str) -> Option<String> {
    attr(node, name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn has_attr(node: &Node, name: &str) -> bool {
    attr(node, name).is_some()
}

/// All attributes of an element as `(name, value)` pairs.
pub fn attributes(node: &Node) -> Vec<(String, String)> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|attribute| (attribute.name.local.to_string(), attribute.value.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn children(node: &Node) -> Vec<Handle> {
    node.children.borrow().clone()
}

pub fn element_children(node: &Node) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

/// First element child with the given tag.
pub fn child_element(node: &Node, tag: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|child| is_tag(child, tag))
        .cloned()
}

/// Elements, comments and text with non-whitespace content.
pub fn is_meaningful(node: &Node) -> bool {
    match &node.data {
        NodeData::Element { .. } | NodeData::Comment { .. } => true,
        NodeData::Text { contents } => !contents.borrow().trim().is_empty(),
        _ => false,
    }
}

pub fn comment_text(node: &Node) -> Option<String> {
    match &node.data {
        NodeData::Comment { contents } => Some(contents.to_string()),
        _ => None,
    }
}

/// Concatenated descendant text. Walks with an explicit stack, so arbitrarily deep
/// trees are fine.
pub fn text_content(node: &Node) -> String {
    let mut out = String::new();
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
        return out;
    }
    let mut stack: Vec<Handle> = node.children.borrow().iter().rev().cloned().collect();
    while let Some(current) = stack.pop() {
        match &current.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            _ => stack.extend(current.children.borrow().iter().rev().cloned()),
        }
    }
    out
}

/// Serializes a node including its own tag.
pub fn outer_html(node: &Handle) -> String {
    serialize_handles(std::slice::from_ref(node))
}

/// Serializes the children of a node.
pub fn inner_html(node: &Handle) -> String {
    serialize_handles(&node.children.borrow())
}

/// Serializes a sequence of sibling nodes.
pub fn serialize_handles(nodes: &[Handle]) -> String {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    for node in nodes {
        let serializable = SerializableHandle::from(node.clone());
        if let Err(err) = serialize(&mut output, &serializable, opts.clone()) {
            log::debug!("html serialization failed: {err}");
        }
    }
    String::from_utf8_lossy(&output).into_owned()
}

/// Create an HTML element with attributes
pub fn create_element(tag: &str, attrs: Vec<(&str, String)>) -> Handle {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        })
        .collect();

    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: qual_name,
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

/// Create a text node
pub fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}

/// Create a comment node
pub fn create_comment(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Comment {
            contents: text.to_string().into(),
        },
    })
}

/// Appends children to a freshly built element. Parent links are not maintained; the
/// built trees are only ever serialized.
pub fn append_all(parent: &Handle, nodes: impl IntoIterator<Item = Handle>) {
    parent.children.borrow_mut().extend(nodes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_comments_stay_in_order() {
        let dom = parse_html("<!--a--><p>x</p><!--b-->");
        let nodes = top_level_nodes(&dom);
        let kinds: Vec<String> = nodes
            .iter()
            .map(|node| {
                comment_text(node)
                    .or_else(|| tag_name(node).map(str::to_string))
                    .unwrap_or_default()
            })
            .collect();
        assert_eq!(kinds, vec!["a", "p", "b"]);
    }

    #[test]
    fn namespaced_tags_keep_their_prefix() {
        let dom = parse_html(r#"<ac:task-list><ac:task>t</ac:task></ac:task-list>"#);
        let nodes = top_level_nodes(&dom);
        assert_eq!(tag_name(&nodes[0]), Some("ac:task-list"));
    }

    #[test]
    fn text_content_of_deep_tree() {
        let depth = 50_000;
        let html = format!("{}x{}", "<span>".repeat(depth), "</span>".repeat(depth));
        let dom = parse_html(&html);
        let nodes = top_level_nodes(&dom);
        assert_eq!(text_content(&nodes[0]), "x");
    }

    #[test]
    fn built_nodes_serialize() {
        let div = create_element("div", vec![("data-macro", "info".to_string())]);
        append_all(&div, [create_text("a < b"), create_comment("c")]);
        assert_eq!(
            outer_html(&div),
            r#"<div data-macro="info">a &lt; b<!--c--></div>"#
        );
    }
}
