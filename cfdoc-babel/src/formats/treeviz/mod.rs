//! Treeviz formatter for AST nodes
//!
//! Treeviz is a visual representation of the AST, one node per line, with box-drawing
//! connectors showing the nesting:
//!
//! <prefix><connector> <icon> <label> (label truncated to 30 characters)
//!
//! Example:
//!
//!     ⧉ Document (3 items)
//!     ├─ § h1 Title
//!     ├─ ℹ info: Heads up
//!     │ └─ ¶ Panel body text
//!     └─ ∅ <ac:structured-macro ac:n…
//!
//! By default only blocks are shown. With the `ast-full` parameter set to `true` inline
//! nodes, table rows and cells are listed too.

use super::icons::get_icon;
use crate::ast::{
    BaseInline, BlockNode, Document, DocumentNode, ImageSource, InlineNode, MacroNode,
    RawContent, SimpleBlock, Table, UnsupportedBlock,
};
use crate::error::FormatError;
use crate::format::Format;
use std::collections::HashMap;

const LABEL_WIDTH: usize = 30;

/// One line of the tree plus its children.
struct Entry {
    node_type: &'static str,
    label: String,
    children: Vec<Entry>,
}

impl Entry {
    fn leaf(node_type: &'static str, label: impl Into<String>) -> Self {
        Self {
            node_type,
            label: label.into(),
            children: Vec::new(),
        }
    }

    fn with_children(node_type: &'static str, label: impl Into<String>, children: Vec<Entry>) -> Self {
        Self {
            node_type,
            label: label.into(),
            children,
        }
    }
}

fn truncate(label: &str) -> String {
    let single_line = label.replace('\n', " ");
    if single_line.chars().count() > LABEL_WIDTH {
        let cut: String = single_line.chars().take(LABEL_WIDTH - 1).collect();
        format!("{cut}…")
    } else {
        single_line
    }
}

struct Builder {
    include_all: bool,
}

impl Builder {
    fn document_node(&self, node: &DocumentNode) -> Entry {
        match node {
            DocumentNode::Block(block) => self.block(block),
            DocumentNode::Macro(node) => self.macro_node(node),
        }
    }

    fn block(&self, block: &BlockNode) -> Entry {
        match block {
            BlockNode::Heading(heading) => Entry::with_children(
                "Heading",
                format!("h{} {}", heading.level, crate::ast::inlines_text(&heading.children)),
                self.inlines(&heading.children),
            ),
            BlockNode::Paragraph(paragraph) => Entry::with_children(
                "Paragraph",
                crate::ast::inlines_text(&paragraph.children),
                self.inlines(&paragraph.children),
            ),
            BlockNode::CodeBlock(code) => Entry::leaf(
                "CodeBlock",
                code.language.clone().unwrap_or_else(|| "(no language)".to_string()),
            ),
            BlockNode::ThematicBreak => Entry::leaf("ThematicBreak", "---"),
            BlockNode::Image(image) => Entry::leaf(
                "Image",
                match &image.source {
                    ImageSource::Url { src } => src.clone(),
                    ImageSource::Attachment { filename, .. } => format!("attachment {filename}"),
                },
            ),
            BlockNode::Table(table) => self.table(table),
            BlockNode::List(list) => Entry::with_children(
                "List",
                format!(
                    "{} {} items",
                    if list.ordered { "ordered" } else { "bullet" },
                    list.items.len()
                ),
                list.items
                    .iter()
                    .map(|item| {
                        let label = match item.checked {
                            Some(true) => "[x]",
                            Some(false) => "[ ]",
                            None => "",
                        };
                        Entry::with_children("ListItem", label, self.simple_blocks(&item.children))
                    })
                    .collect(),
            ),
            BlockNode::TaskList(tasks) => Entry::with_children(
                "TaskList",
                format!("{} tasks", tasks.items.len()),
                tasks
                    .items
                    .iter()
                    .map(|task| {
                        Entry::with_children(
                            "TaskItem",
                            format!(
                                "{} {}",
                                task.status.as_str(),
                                crate::ast::inlines_text(&task.body)
                            ),
                            self.inlines(&task.body),
                        )
                    })
                    .collect(),
            ),
            BlockNode::BlockQuote(quote) => Entry::with_children(
                "BlockQuote",
                format!("{} blocks", quote.children.len()),
                self.simple_blocks(&quote.children),
            ),
            BlockNode::Unsupported(block) => unsupported_block(block),
        }
    }

    fn simple_blocks(&self, blocks: &[SimpleBlock]) -> Vec<Entry> {
        blocks
            .iter()
            .map(|block| self.block(&BlockNode::from(block.clone())))
            .collect()
    }

    fn table(&self, table: &Table) -> Entry {
        let rows: Vec<Entry> = if self.include_all {
            table
                .header
                .iter()
                .map(|row| (row, "header"))
                .chain(table.rows.iter().map(|row| (row, "row")))
                .map(|(row, kind)| {
                    let cells = row
                        .cells
                        .iter()
                        .map(|cell| {
                            Entry::with_children(
                                "TableCell",
                                crate::ast::inlines_text(&cell.children),
                                self.inlines(&cell.children),
                            )
                        })
                        .collect();
                    Entry::with_children("TableRow", kind, cells)
                })
                .collect()
        } else {
            Vec::new()
        };
        let header = if table.header.is_some() { ", header" } else { "" };
        Entry::with_children("Table", format!("{} rows{header}", table.rows.len()), rows)
    }

    fn macro_node(&self, node: &MacroNode) -> Entry {
        match node {
            MacroNode::InfoPanel(panel) => Entry::with_children(
                "InfoPanel",
                match &panel.title {
                    Some(title) => format!("{}: {title}", panel.panel_type.as_str()),
                    None => panel.panel_type.as_str().to_string(),
                },
                self.simple_blocks(&panel.children),
            ),
            MacroNode::ExpandMacro(expand) => Entry::with_children(
                "ExpandMacro",
                expand.title.clone().unwrap_or_default(),
                self.simple_blocks(&expand.children),
            ),
            MacroNode::TocMacro(toc) => Entry::leaf(
                "TocMacro",
                format!(
                    "levels {}-{}",
                    toc.min_level.unwrap_or(1),
                    toc.max_level.unwrap_or(6)
                ),
            ),
            MacroNode::CodeMacro(code) => Entry::leaf(
                "CodeMacro",
                code.title
                    .clone()
                    .or_else(|| code.language.clone())
                    .unwrap_or_default(),
            ),
            MacroNode::StatusMacro(status) => Entry::leaf(
                "StatusMacro",
                format!("{} ({})", status.text, status.color.as_str()),
            ),
        }
    }

    fn inlines(&self, nodes: &[InlineNode]) -> Vec<Entry> {
        if !self.include_all {
            return Vec::new();
        }
        nodes.iter().map(inline).collect()
    }
}

fn inline(node: &InlineNode) -> Entry {
    match node {
        InlineNode::Unsupported(raw) => Entry::leaf("UnsupportedInline", raw.raw.clone()),
        InlineNode::Strong { children }
        | InlineNode::Emphasis { children }
        | InlineNode::Underline { children }
        | InlineNode::Strikethrough { children }
        | InlineNode::Subscript { children }
        | InlineNode::Superscript { children }
        | InlineNode::ColoredText { children, .. }
        | InlineNode::Highlight { children, .. } => Entry::with_children(
            node.node_type(),
            node.text_content(),
            children.iter().map(base_inline).collect(),
        ),
        InlineNode::Link { href, children, .. } => Entry::with_children(
            "Link",
            href.clone(),
            children.iter().map(base_inline).collect(),
        ),
        _ => Entry::leaf(node.node_type(), node.text_content()),
    }
}

fn base_inline(node: &BaseInline) -> Entry {
    inline(&InlineNode::from(node.clone()))
}

fn unsupported_block(block: &UnsupportedBlock) -> Entry {
    let raw = match &block.raw {
        RawContent::Html(raw) | RawContent::Markdown(raw) => raw.clone(),
    };
    Entry::leaf("UnsupportedBlock", raw)
}

fn render(entry: &Entry, prefix: &str, is_last: bool, output: &mut String) {
    let connector = if is_last { "└─" } else { "├─" };
    output.push_str(&format!(
        "{}{} {} {}\n",
        prefix,
        connector,
        get_icon(entry.node_type),
        truncate(&entry.label)
    ));
    let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    render_children(&entry.children, &child_prefix, output);
}

fn render_children(children: &[Entry], prefix: &str, output: &mut String) {
    for (i, child) in children.iter().enumerate() {
        render(child, prefix, i == children.len() - 1, output);
    }
}

pub fn to_treeviz_str(doc: &Document) -> String {
    to_treeviz_str_with_params(doc, &HashMap::new())
}

/// Convert a document to treeviz string with optional parameters
///
/// # Parameters
///
/// - `"ast-full"`: When set to `"true"`, includes inline nodes and table rows/cells.
pub fn to_treeviz_str_with_params(doc: &Document, params: &HashMap<String, String>) -> String {
    let include_all = params
        .get("ast-full")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);
    let builder = Builder { include_all };

    let mut output = format!(
        "{} Document ({} items{})\n",
        get_icon("Document"),
        doc.len(),
        if doc.has_original_source() {
            ", source captured"
        } else {
            ""
        }
    );
    let entries: Vec<Entry> = doc
        .children()
        .iter()
        .map(|node| builder.document_node(node))
        .collect();
    render_children(&entries, "", &mut output);
    output
}

/// Format implementation for treeviz format
pub struct TreevizFormat;

impl Format for TreevizFormat {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn description(&self) -> &str {
        "Visual tree representation with indentation and Unicode icons"
    }

    fn file_extensions(&self) -> &[&str] {
        &["tree", "treeviz"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        Ok(to_treeviz_str(doc))
    }

    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<String, FormatError> {
        Ok(to_treeviz_str_with_params(doc, options))
    }
}
