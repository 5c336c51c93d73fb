//! Markdown serialization (AST → Markdown export)
//!
//! Pipeline: AST → Comrak AST → Markdown string
//!
//! Building the comrak tree cannot fail: every node has some Markdown rendition, in the
//! worst case a raw HTML block carrying the stored markup.

use super::{comrak_options, MarkdownOptions};
use crate::ast::{
    BaseInline, BlockNode, Document, DocumentNode, Image, ImageSource, InlineNode, List,
    MacroNode, RawContent, SimpleBlock, Table, TableRow, TaskList, TaskStatus,
};
use crate::common::escape::html_escape;
use crate::error::SerializeError;
use comrak::nodes::{
    Ast, AstNode, ListDelimType, ListType, NodeCode, NodeCodeBlock, NodeHeading, NodeHtmlBlock,
    NodeLink, NodeList, NodeTable, NodeValue, TableAlignment,
};
use comrak::{format_commonmark, Arena};
use std::cell::RefCell;

/// Serialize a document to a Markdown string
pub fn serialize_to_markdown(
    doc: &Document,
    options: &MarkdownOptions,
) -> Result<String, SerializeError> {
    let arena = Arena::new();
    let root = to_markdown(&arena, doc, options);

    let mut render = comrak_options();
    render.render.list_style = options.list_style();

    let mut output = Vec::new();
    format_commonmark(root, &render, &mut output)
        .map_err(|e| SerializeError::new(format!("Comrak serialization failed: {e}")))?;
    let markdown = String::from_utf8(output)
        .map_err(|e| SerializeError::new(format!("UTF-8 conversion failed: {e}")))?;

    // Remove Comrak's "end list" HTML comments which appear between consecutive lists
    Ok(markdown.replace("<!-- end list -->\n\n", ""))
}

/// Builds the comrak tree for a document inside `arena` and returns its root.
pub fn to_markdown<'a>(
    arena: &'a Arena<AstNode<'a>>,
    doc: &Document,
    options: &MarkdownOptions,
) -> &'a AstNode<'a> {
    let builder = Builder { arena, options };
    let root = builder.node(NodeValue::Document);
    for child in doc.children() {
        match child {
            DocumentNode::Block(block) => builder.block(root, block),
            DocumentNode::Macro(node) => builder.macro_node(root, node),
        }
    }
    root
}

struct Builder<'a, 'o> {
    arena: &'a Arena<AstNode<'a>>,
    options: &'o MarkdownOptions,
}

impl<'a> Builder<'a, '_> {
    fn node(&self, value: NodeValue) -> &'a AstNode<'a> {
        self.arena
            .alloc(AstNode::new(RefCell::new(Ast::new(value, (0, 0).into()))))
    }

    fn append(&self, parent: &'a AstNode<'a>, value: NodeValue) -> &'a AstNode<'a> {
        let node = self.node(value);
        parent.append(node);
        node
    }

    fn html_block(&self, parent: &'a AstNode<'a>, literal: String) {
        self.append(
            parent,
            NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal,
            }),
        );
    }

    fn block(&self, parent: &'a AstNode<'a>, block: &BlockNode) {
        match block {
            BlockNode::Heading(heading) => self.heading(parent, heading.level, &heading.children),
            BlockNode::Paragraph(paragraph) => self.paragraph(parent, &paragraph.children),
            BlockNode::CodeBlock(code) => self.code_block(parent, &code.code, &code.language),
            BlockNode::ThematicBreak => {
                self.append(parent, NodeValue::ThematicBreak);
            }
            BlockNode::Image(image) => self.image(parent, image),
            BlockNode::Table(table) => self.table(parent, table),
            BlockNode::List(list) => self.list(parent, list),
            BlockNode::TaskList(tasks) => self.task_list(parent, tasks),
            BlockNode::BlockQuote(quote) => {
                let node = self.append(parent, NodeValue::BlockQuote);
                self.simple_blocks(node, &quote.children);
            }
            BlockNode::Unsupported(block) => self.raw(parent, &block.raw),
        }
    }

    fn simple_blocks(&self, parent: &'a AstNode<'a>, blocks: &[SimpleBlock]) {
        for block in blocks {
            match block {
                SimpleBlock::Heading(heading) => {
                    self.heading(parent, heading.level, &heading.children)
                }
                SimpleBlock::Paragraph(paragraph) => self.paragraph(parent, &paragraph.children),
                SimpleBlock::CodeBlock(code) => {
                    self.code_block(parent, &code.code, &code.language)
                }
                SimpleBlock::ThematicBreak => {
                    self.append(parent, NodeValue::ThematicBreak);
                }
                SimpleBlock::Image(image) => self.image(parent, image),
                SimpleBlock::Table(table) => self.table(parent, table),
                SimpleBlock::Unsupported(block) => self.raw(parent, &block.raw),
            }
        }
    }

    fn heading(&self, parent: &'a AstNode<'a>, level: u8, children: &[InlineNode]) {
        let node = self.append(
            parent,
            NodeValue::Heading(NodeHeading {
                level: level.clamp(1, 6),
                setext: false,
            }),
        );
        self.inlines(node, children);
    }

    /// Raw inline markup spanning several lines is lifted out of the paragraph into an
    /// HTML block, splitting the paragraph around it.
    fn paragraph(&self, parent: &'a AstNode<'a>, children: &[InlineNode]) {
        let Some(split) = children.iter().position(is_multiline_raw) else {
            let node = self.append(parent, NodeValue::Paragraph);
            self.inlines(node, children);
            return;
        };
        let (before, after) = (&children[..split], &children[split + 1..]);
        if !before.is_empty() {
            self.paragraph(parent, before);
        }
        if let InlineNode::Unsupported(raw) = &children[split] {
            self.html_block(parent, raw.raw.trim_end().to_string());
        }
        if !after.is_empty() {
            self.paragraph(parent, after);
        }
    }

    fn code_block(&self, parent: &'a AstNode<'a>, code: &str, language: &Option<String>) {
        let mut literal = code.to_string();
        if !literal.ends_with('\n') {
            literal.push('\n');
        }
        self.append(
            parent,
            NodeValue::CodeBlock(NodeCodeBlock {
                fenced: true,
                fence_char: b'`',
                fence_length: 3,
                fence_offset: 0,
                info: language.clone().unwrap_or_default(),
                literal,
            }),
        );
    }

    fn image(&self, parent: &'a AstNode<'a>, image: &Image) {
        let url = match &image.source {
            ImageSource::Url { src } => src.clone(),
            ImageSource::Attachment { filename, .. } => filename.clone(),
        };
        let paragraph = self.append(parent, NodeValue::Paragraph);
        let node = self.append(
            paragraph,
            NodeValue::Image(NodeLink {
                url,
                title: image.title.clone().unwrap_or_default(),
            }),
        );
        if let Some(alt) = &image.alt {
            self.append(node, NodeValue::Text(alt.clone()));
        }
    }

    fn table(&self, parent: &'a AstNode<'a>, table: &Table) {
        // GFM tables always have a header row
        let mut rows: Vec<&TableRow> = table.header.iter().chain(table.rows.iter()).collect();
        if rows.is_empty() {
            return;
        }
        let num_columns = rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);
        if num_columns == 0 {
            return;
        }
        let node = self.append(
            parent,
            NodeValue::Table(NodeTable {
                alignments: vec![TableAlignment::None; num_columns],
                num_columns,
                num_rows: rows.len(),
                num_nonempty_cells: 0,
            }),
        );
        let header = rows.remove(0);
        self.table_row(node, header, true, num_columns);
        for row in rows {
            self.table_row(node, row, false, num_columns);
        }
    }

    fn table_row(&self, table: &'a AstNode<'a>, row: &TableRow, header: bool, columns: usize) {
        let node = self.append(table, NodeValue::TableRow(header));
        for index in 0..columns {
            let cell = self.append(node, NodeValue::TableCell);
            if let Some(source) = row.cells.get(index) {
                self.inlines(cell, &source.children);
            }
        }
    }

    fn list_node(&self, ordered: bool, start: usize) -> NodeList {
        NodeList {
            list_type: if ordered {
                ListType::Ordered
            } else {
                ListType::Bullet
            },
            marker_offset: 0,
            padding: 0,
            start,
            delimiter: ListDelimType::Period,
            bullet_char: self.options.bullet_byte(),
            tight: self.options.tight_lists,
        }
    }

    fn list(&self, parent: &'a AstNode<'a>, list: &List) {
        let start = list.start.unwrap_or(1) as usize;
        let node = self.append(
            parent,
            NodeValue::List(self.list_node(list.ordered, start)),
        );
        for item in &list.items {
            let value = match item.checked {
                Some(true) => NodeValue::TaskItem(Some('x')),
                Some(false) => NodeValue::TaskItem(None),
                None => NodeValue::Item(self.list_node(list.ordered, start)),
            };
            let item_node = self.append(node, value);
            self.simple_blocks(item_node, &item.children);
        }
    }

    fn task_list(&self, parent: &'a AstNode<'a>, tasks: &TaskList) {
        let node = self.append(parent, NodeValue::List(self.list_node(false, 1)));
        for task in &tasks.items {
            let symbol = match task.status {
                TaskStatus::Complete => Some('x'),
                TaskStatus::Incomplete => None,
            };
            let item = self.append(node, NodeValue::TaskItem(symbol));
            let paragraph = self.append(item, NodeValue::Paragraph);
            self.inlines(paragraph, &task.body);
        }
    }

    fn raw(&self, parent: &'a AstNode<'a>, raw: &RawContent) {
        match raw {
            RawContent::Html(html) | RawContent::Markdown(html) => {
                self.html_block(parent, html.trim_end().to_string())
            }
        }
    }

    fn macro_node(&self, parent: &'a AstNode<'a>, node: &MacroNode) {
        match node {
            MacroNode::InfoPanel(panel) => {
                let fence = match &panel.title {
                    Some(title) => format!(":::{} {}", panel.panel_type.as_str(), title),
                    None => format!(":::{}", panel.panel_type.as_str()),
                };
                self.html_block(parent, fence);
                self.simple_blocks(parent, &panel.children);
                self.html_block(parent, ":::".to_string());
            }
            MacroNode::ExpandMacro(expand) => {
                let title = expand.title.as_deref().unwrap_or_default();
                self.html_block(
                    parent,
                    format!("<details><summary>{}</summary>", html_escape(title)),
                );
                self.simple_blocks(parent, &expand.children);
                self.html_block(parent, "</details>".to_string());
            }
            MacroNode::TocMacro(_) => {
                let paragraph = self.append(parent, NodeValue::Paragraph);
                self.append(
                    paragraph,
                    NodeValue::HtmlInline(self.options.toc_placeholder.clone()),
                );
            }
            MacroNode::CodeMacro(code) => self.code_block(parent, &code.code, &code.language),
            MacroNode::StatusMacro(status) => {
                let paragraph = self.append(parent, NodeValue::Paragraph);
                self.status(paragraph, &status.text);
            }
        }
    }

    fn status(&self, parent: &'a AstNode<'a>, text: &str) {
        self.append(parent, NodeValue::HtmlInline(format!("[{}]", text.to_uppercase())));
    }

    fn text(&self, parent: &'a AstNode<'a>, text: &str) {
        if !text.is_empty() {
            self.append(parent, NodeValue::Text(text.replace('\n', " ")));
        }
    }

    fn inlines(&self, parent: &'a AstNode<'a>, nodes: &[InlineNode]) {
        for node in nodes {
            self.inline(parent, node);
        }
    }

    fn inline(&self, parent: &'a AstNode<'a>, inline: &InlineNode) {
        match inline {
            InlineNode::Text { value } => self.text(parent, value),
            InlineNode::Strong { children } => self.mark(parent, NodeValue::Strong, children),
            InlineNode::Emphasis { children } => self.mark(parent, NodeValue::Emph, children),
            InlineNode::Strikethrough { children } => {
                self.mark(parent, NodeValue::Strikethrough, children)
            }
            InlineNode::Underline { children } => self.html_mark(parent, "u", children),
            InlineNode::Subscript { children } => self.html_mark(parent, "sub", children),
            InlineNode::Superscript { children } => self.html_mark(parent, "sup", children),
            InlineNode::InlineCode { value } => self.code(parent, value),
            InlineNode::Link {
                href,
                title,
                children,
            } => {
                let node = self.append(
                    parent,
                    NodeValue::Link(NodeLink {
                        url: href.clone(),
                        title: title.clone().unwrap_or_default(),
                    }),
                );
                self.base_inlines(node, children);
            }
            InlineNode::LineBreak => {
                self.append(parent, NodeValue::LineBreak);
            }
            InlineNode::DateTime { datetime } => self.text(parent, datetime),
            InlineNode::Emoticon {
                shortname,
                fallback,
                ..
            } => {
                let text = if fallback.is_empty() {
                    shortname
                } else {
                    fallback
                };
                self.text(parent, text);
            }
            InlineNode::UserMention { account_id } => self.text(parent, &format!("@{account_id}")),
            InlineNode::ColoredText { children, .. } | InlineNode::Highlight { children, .. } => {
                self.base_inlines(parent, children)
            }
            InlineNode::Unsupported(raw) => self.raw_inline(parent, &raw.raw),
        }
    }

    fn base_inlines(&self, parent: &'a AstNode<'a>, nodes: &[BaseInline]) {
        for node in nodes {
            match node {
                BaseInline::Text { value } => self.text(parent, value),
                BaseInline::InlineCode { value } => self.code(parent, value),
                BaseInline::LineBreak => {
                    self.append(parent, NodeValue::LineBreak);
                }
                BaseInline::Unsupported(raw) => self.raw_inline(parent, &raw.raw),
            }
        }
    }

    fn mark(&self, parent: &'a AstNode<'a>, value: NodeValue, children: &[BaseInline]) {
        let node = self.append(parent, value);
        self.base_inlines(node, children);
    }

    fn html_mark(&self, parent: &'a AstNode<'a>, tag: &str, children: &[BaseInline]) {
        self.append(parent, NodeValue::HtmlInline(format!("<{tag}>")));
        self.base_inlines(parent, children);
        self.append(parent, NodeValue::HtmlInline(format!("</{tag}>")));
    }

    fn code(&self, parent: &'a AstNode<'a>, value: &str) {
        self.append(
            parent,
            NodeValue::Code(NodeCode {
                num_backticks: 1,
                literal: value.to_string(),
            }),
        );
    }

    fn raw_inline(&self, parent: &'a AstNode<'a>, raw: &str) {
        // Only reached for multi-line markup inside headings, cells and marks, where a
        // line break would end the row or heading
        self.append(parent, NodeValue::HtmlInline(raw.replace('\n', " ")));
    }
}

fn is_multiline_raw(inline: &InlineNode) -> bool {
    matches!(inline, InlineNode::Unsupported(raw) if raw.raw.contains('\n'))
}
