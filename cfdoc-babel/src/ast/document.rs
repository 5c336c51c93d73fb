//! The document root.

use super::blocks::{BlockNode, MacroNode};
use serde::{Deserialize, Serialize};

/// A top-level node: structural block or wiki macro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentNode {
    Block(BlockNode),
    Macro(MacroNode),
}

impl DocumentNode {
    pub fn node_type(&self) -> &'static str {
        match self {
            DocumentNode::Block(block) => block.node_type(),
            DocumentNode::Macro(node) => node.node_type(),
        }
    }
}

impl From<BlockNode> for DocumentNode {
    fn from(block: BlockNode) -> Self {
        DocumentNode::Block(block)
    }
}

impl From<MacroNode> for DocumentNode {
    fn from(node: MacroNode) -> Self {
        DocumentNode::Macro(node)
    }
}

/// An ordered sequence of top-level nodes, optionally carrying the verbatim storage markup
/// it was parsed from.
///
/// The cached source is the serializer's round-trip shortcut. It is only valid while the
/// children are exactly what the parser produced, so every mutable access drops it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    children: Vec<DocumentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_source: Option<String>,
}

impl Document {
    /// Creates a document with no cached source.
    pub fn new(children: Vec<DocumentNode>) -> Self {
        Self {
            children,
            original_source: None,
        }
    }

    pub(crate) fn from_parse(children: Vec<DocumentNode>, source: Option<String>) -> Self {
        Self {
            children,
            original_source: source,
        }
    }

    pub fn children(&self) -> &[DocumentNode] {
        &self.children
    }

    pub fn original_source(&self) -> Option<&str> {
        self.original_source.as_deref()
    }

    pub fn has_original_source(&self) -> bool {
        self.original_source.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Mutable access to the children. Drops the cached source.
    pub fn children_mut(&mut self) -> &mut Vec<DocumentNode> {
        self.original_source = None;
        &mut self.children
    }

    /// Appends a node. Drops the cached source.
    pub fn push(&mut self, node: impl Into<DocumentNode>) {
        self.children_mut().push(node.into());
    }

    /// Replaces the children. The result never carries a cached source.
    pub fn with_children(self, children: Vec<DocumentNode>) -> Self {
        Self::new(children)
    }

    /// The same document without its cached source.
    pub fn into_clean(self) -> Self {
        Self::new(self.children)
    }

    pub fn into_children(self) -> Vec<DocumentNode> {
        self.children
    }
}

impl FromIterator<DocumentNode> for Document {
    fn from_iter<T: IntoIterator<Item = DocumentNode>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{InlineNode, Paragraph};

    fn paragraph(text: &str) -> DocumentNode {
        BlockNode::Paragraph(Paragraph::new(vec![InlineNode::text(text)])).into()
    }

    #[test]
    fn mutation_drops_cached_source() {
        let mut doc = Document::from_parse(vec![paragraph("a")], Some("<p>a</p>".into()));
        assert_eq!(doc.original_source(), Some("<p>a</p>"));

        doc.push(paragraph("b"));
        assert!(!doc.has_original_source());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn children_mut_drops_cached_source_even_without_changes() {
        let mut doc = Document::from_parse(vec![paragraph("a")], Some("<p>a</p>".into()));
        let _ = doc.children_mut();
        assert_eq!(doc.original_source(), None);
    }

    #[test]
    fn into_clean_keeps_children() {
        let doc = Document::from_parse(vec![paragraph("a")], Some("<p>a</p>".into()));
        let clean = doc.clone().into_clean();
        assert_eq!(clean.children(), doc.children());
        assert!(!clean.has_original_source());
    }

    #[test]
    fn untagged_document_node_serializes_inner_tag() {
        let json = serde_json::to_value(paragraph("x")).unwrap();
        assert_eq!(json["type"], "Paragraph");
    }
}
