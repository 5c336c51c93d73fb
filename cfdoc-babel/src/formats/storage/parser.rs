//! Storage parsing (preprocessed storage HTML → AST)
//!
//! Pipeline: raw storage → [`Preprocessor`] → html5ever RcDom → AST.
//!
//! Each top-level node of the preprocessed fragment becomes zero or one
//! [`DocumentNode`]. Block dispatch, first match wins:
//!
//!     h1-h6, p, pre (code block or code macro), hr, img, table,
//!     ul[data-macro=task-list], ul/ol, blockquote,
//!     panel div / expand details / toc nav / status span,
//!     [data-unsupported-macro], [data-cf-marker],
//!     generic containers (unwrapped to their first meaningful child),
//!     ignored structure (br, html, head, body),
//!     inline tags (wrapped in a paragraph),
//!     anything else (UnsupportedBlock with the element's markup)
//!
//! Content that the AST can not hold at a given position (a nested list inside a list
//! item, a macro inside a panel, nested formatting inside `<strong>`) is parsed normally,
//! serialized back to storage markup and carried as an Unsupported node, so nothing is
//! dropped and a storage round trip reproduces it.

use super::html_tree::{
    attr, child_element, children, comment_text, has_attr, inner_html, is_meaningful, is_tag,
    non_empty_attr, outer_html, parse_errors, parse_html, tag_name, text_content,
    top_level_nodes,
};
use super::preprocess::{
    Preprocessor, StoragePreprocessor, DEFAULT_MAX_INPUT_BYTES, DEFAULT_MAX_NESTING_DEPTH,
};
use super::serializer::{inline_to_storage, node_to_storage};
use crate::ast::{
    BaseInline, BlockNode, BlockQuote, CodeBlock, CodeMacro, Document, DocumentNode,
    ExpandMacro, Heading, Image, ImageSource, InfoPanel, InlineNode, List, ListItem,
    MacroNode, PanelType, Paragraph, SimpleBlock, StatusColor, StatusMacro, Table, TableCell,
    TableRow, TaskItem, TaskList, TaskStatus, TocMacro, UnsupportedBlock, UnsupportedInline,
};
use crate::common::codec::Marker;
use crate::common::style::{parse_alignment, parse_px, style_value};
use crate::error::ParseError;
use markup5ever_rcdom::{Handle, NodeData};

/// Parser behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Inputs larger than this are rejected by the preprocessor.
    pub max_input_bytes: usize,
    /// Treat recoverable HTML errors as failures instead of logging them.
    pub strict_html: bool,
    /// Keep the raw input on the document for the serializer's round-trip shortcut.
    pub capture_original_source: bool,
    /// Elements nested deeper than this are kept verbatim instead of being converted.
    pub max_nesting_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            strict_html: false,
            capture_original_source: true,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Parses raw storage markup with default options.
pub fn parse_storage_format(raw: &str) -> Result<Document, ParseError> {
    parse_storage_format_with(raw, &ParserOptions::default())
}

/// Parses raw storage markup through the default [`StoragePreprocessor`].
pub fn parse_storage_format_with(raw: &str, options: &ParserOptions) -> Result<Document, ParseError> {
    let preprocessor = StoragePreprocessor::new(options.max_input_bytes)
        .with_max_nesting_depth(options.max_nesting_depth);
    parse_with_preprocessor(raw, &preprocessor, options)
}

/// Parses raw storage markup through a caller supplied preprocessor.
pub fn parse_with_preprocessor(
    raw: &str,
    preprocessor: &dyn Preprocessor,
    options: &ParserOptions,
) -> Result<Document, ParseError> {
    let preprocessed = preprocessor.preprocess(raw)?;
    let children = parse_nodes(&preprocessed, options)?;
    let source = options.capture_original_source.then(|| raw.to_string());
    Ok(Document::from_parse(children, source))
}

/// Parses markup that is already in the preprocessed dialect. The result carries no
/// original source.
pub fn parse(preprocessed: &str, options: &ParserOptions) -> Result<Document, ParseError> {
    Ok(Document::new(parse_nodes(preprocessed, options)?))
}

fn parse_nodes(preprocessed: &str, options: &ParserOptions) -> Result<Vec<DocumentNode>, ParseError> {
    let dom = parse_html(preprocessed);
    let errors = parse_errors(&dom);
    if !errors.is_empty() {
        if options.strict_html {
            return Err(ParseError::html(
                format!("{} recoverable HTML error(s), first: {}", errors.len(), errors[0]),
                preprocessed,
            ));
        }
        for error in &errors {
            log::debug!("recovered from HTML error: {error}");
        }
    }

    let parser = StorageParser { options };
    Ok(parser.root_blocks(&top_level_nodes(&dom)))
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn is_inline_tag(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "abbr"
            | "b"
            | "cite"
            | "code"
            | "em"
            | "i"
            | "s"
            | "del"
            | "strike"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "u"
            | "time"
            | "br"
    )
}

fn is_generic_container(tag: &str) -> bool {
    matches!(
        tag,
        "div" | "section" | "article" | "main" | "header" | "footer" | "aside"
    )
}

/// Text and phrasing elements, which group into paragraphs inside flow content.
fn is_inline_node(node: &Handle) -> bool {
    match &node.data {
        NodeData::Text { .. } => true,
        NodeData::Element { .. } => tag_name(node).is_some_and(is_inline_tag),
        _ => false,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn unsupported_block(raw: impl Into<String>) -> DocumentNode {
    BlockNode::Unsupported(UnsupportedBlock::confluence_html(raw)).into()
}

fn unsupported_inline(raw: impl Into<String>) -> InlineNode {
    InlineNode::Unsupported(UnsupportedInline::confluence(raw))
}

fn marker_inline(marker: Marker) -> InlineNode {
    unsupported_inline(marker.to_comment())
}

fn comment_block(text: &str) -> DocumentNode {
    match Marker::decode(text) {
        Some(marker) => log::debug!("side-channel marker {marker:?}"),
        None => log::debug!("keeping plain comment verbatim"),
    }
    unsupported_block(format!("<!--{text}-->"))
}

/// Appends text, merging it into a preceding text node.
fn push_text(out: &mut Vec<InlineNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(InlineNode::Text { value }) = out.last_mut() {
        value.push_str(text);
        return;
    }
    out.push(InlineNode::text(text));
}

/// Removes leading and trailing whitespace of a run of inlines, dropping emptied text.
fn trim_edges(mut nodes: Vec<InlineNode>) -> Vec<InlineNode> {
    if let Some(InlineNode::Text { value }) = nodes.first_mut() {
        *value = value.trim_start().to_string();
    }
    if let Some(InlineNode::Text { value }) = nodes.last_mut() {
        *value = value.trim_end().to_string();
    }
    nodes.retain(|node| !matches!(node, InlineNode::Text { value } if value.is_empty()));
    nodes
}

struct StorageParser<'a> {
    options: &'a ParserOptions,
}

impl StorageParser<'_> {
    fn too_deep(&self, depth: usize) -> bool {
        depth > self.options.max_nesting_depth
    }

    fn block(&self, node: &Handle, depth: usize) -> Option<DocumentNode> {
        match &node.data {
            NodeData::Text { contents } => {
                let text = contents.borrow();
                let text = text.trim();
                (!text.is_empty()).then(|| {
                    BlockNode::Paragraph(Paragraph::new(vec![InlineNode::text(text)])).into()
                })
            }
            NodeData::Comment { contents } => Some(comment_block(contents)),
            NodeData::Element { .. } => self.element_block(node, depth),
            _ => None,
        }
    }

    fn element_block(&self, node: &Handle, depth: usize) -> Option<DocumentNode> {
        if self.too_deep(depth) {
            log::debug!("nesting depth {depth} exceeded, keeping element verbatim");
            return Some(unsupported_block(outer_html(node)));
        }
        let tag = tag_name(node)?.to_string();
        let data_macro = attr(node, "data-macro");
        let next = depth + 1;

        let converted: DocumentNode = match (tag.as_str(), data_macro.as_deref()) {
            (h, _) if heading_level(h).is_some() => BlockNode::Heading(Heading {
                level: heading_level(h).unwrap_or(1),
                children: self.inlines(&children(node), next),
            })
            .into(),
            ("p", _) => BlockNode::Paragraph(self.paragraph(node, next)).into(),
            ("pre", Some("code")) => MacroNode::CodeMacro(self.code_macro(node)).into(),
            ("pre", _) => BlockNode::CodeBlock(CodeBlock {
                code: code_text(node),
                language: non_empty_attr(node, "data-language"),
            })
            .into(),
            ("hr", _) => BlockNode::ThematicBreak.into(),
            ("img", _) => self.image(node).into(),
            ("table", _) => BlockNode::Table(self.table(node, next)).into(),
            ("ul", Some("task-list")) => BlockNode::TaskList(self.task_list(node, next)).into(),
            ("ul" | "ol", _) => BlockNode::List(self.list(node, next)).into(),
            ("blockquote", _) => BlockNode::BlockQuote(BlockQuote {
                children: self.simple_blocks(&children(node), next),
            })
            .into(),
            ("div", Some(name)) if PanelType::from_name(name).is_some() => {
                MacroNode::InfoPanel(InfoPanel {
                    panel_type: PanelType::from_name(name).unwrap_or(PanelType::Info),
                    title: non_empty_attr(node, "data-title"),
                    children: self.simple_blocks(&children(node), next),
                })
                .into()
            }
            ("details", Some("expand")) => MacroNode::ExpandMacro(self.expand(node, next)).into(),
            ("nav" | "span", Some("toc")) => MacroNode::TocMacro(toc(node)).into(),
            ("span", Some("status")) => MacroNode::StatusMacro(StatusMacro {
                text: text_content(node).trim().to_string(),
                color: StatusColor::parse(&attr(node, "data-color").unwrap_or_default()),
            })
            .into(),
            _ if has_attr(node, "data-unsupported-macro") => unsupported_block(inner_html(node)),
            _ if has_attr(node, "data-cf-marker") => {
                let comment = children(node).iter().find_map(|child| comment_text(child));
                match comment {
                    Some(text) => comment_block(&text),
                    None => unsupported_block(inner_html(node)),
                }
            }
            (container, _) if is_generic_container(container) => {
                return self.unwrap_container(node, next);
            }
            ("br" | "html" | "head" | "body", _) => return None,
            (inline, _) if is_inline_tag(inline) => BlockNode::Paragraph(Paragraph::new(
                self.inlines(std::slice::from_ref(node), next),
            ))
            .into(),
            (other, _) => {
                log::debug!("no structured form for <{other}>, keeping it verbatim");
                unsupported_block(outer_html(node))
            }
        };
        Some(converted)
    }

    /// Generic wrappers are replaced by their first meaningful child. Later siblings are
    /// dropped.
    fn unwrap_container(&self, node: &Handle, depth: usize) -> Option<DocumentNode> {
        let meaningful: Vec<Handle> = children(node)
            .into_iter()
            .filter(|child| is_meaningful(child))
            .collect();
        if meaningful.len() > 1 {
            log::debug!(
                "unwrapping container with {} children to its first",
                meaningful.len()
            );
        }
        meaningful
            .iter()
            .find_map(|child| self.block(child, depth))
    }

    fn paragraph(&self, node: &Handle, depth: usize) -> Paragraph {
        let style = attr(node, "style").unwrap_or_default();
        Paragraph {
            children: self.inlines(&children(node), depth),
            alignment: style_value(&style, "text-align").and_then(|v| parse_alignment(&v)),
            indent: style_value(&style, "margin-left").and_then(|v| parse_px(&v)),
        }
    }

    fn code_macro(&self, node: &Handle) -> CodeMacro {
        CodeMacro {
            language: non_empty_attr(node, "data-language"),
            title: non_empty_attr(node, "data-title"),
            code: code_text(node),
            line_numbers: attr(node, "data-linenumbers").and_then(|v| parse_bool(&v)),
            collapse: attr(node, "data-collapse").and_then(|v| parse_bool(&v)),
            first_line: attr(node, "data-firstline").and_then(|v| v.trim().parse().ok()),
        }
    }

    fn image(&self, node: &Handle) -> BlockNode {
        let source = if let Some(filename) = non_empty_attr(node, "data-attachment") {
            ImageSource::Attachment {
                filename,
                version: attr(node, "data-version").and_then(|v| v.trim().parse().ok()),
            }
        } else if let Some(src) = non_empty_attr(node, "src") {
            ImageSource::Url { src }
        } else {
            return BlockNode::Unsupported(UnsupportedBlock::confluence_html(outer_html(node)));
        };
        BlockNode::Image(Image {
            source,
            alt: non_empty_attr(node, "alt"),
            title: non_empty_attr(node, "title"),
            align: non_empty_attr(node, "data-align"),
            width: attr(node, "data-width").and_then(|v| parse_px(&v)),
        })
    }

    fn table(&self, node: &Handle, depth: usize) -> Table {
        let mut table = Table::default();
        for section in children(node) {
            match tag_name(&section) {
                Some("thead") => {
                    for (index, row) in rows_of(&section).iter().enumerate() {
                        let row = self.table_row(row, depth + 1);
                        if index == 0 && table.header.is_none() {
                            table.header = Some(row);
                        } else {
                            table.rows.push(row);
                        }
                    }
                }
                Some("tbody" | "tfoot") => {
                    for row in rows_of(&section) {
                        table.rows.push(self.table_row(&row, depth + 1));
                    }
                }
                Some("tr") => table.rows.push(self.table_row(&section, depth)),
                _ => {}
            }
        }

        let promote = table.header.is_none()
            && table.rows.first().is_some_and(|row| {
                !row.cells.is_empty() && row.cells.iter().all(|cell| cell.is_header)
            });
        if promote {
            table.header = Some(table.rows.remove(0));
        }
        table
    }

    fn table_row(&self, row: &Handle, depth: usize) -> TableRow {
        TableRow {
            cells: children(row)
                .iter()
                .filter(|cell| is_tag(cell, "td") || is_tag(cell, "th"))
                .map(|cell| TableCell {
                    is_header: is_tag(cell, "th"),
                    children: self.hoisted_inlines(cell, depth + 1),
                    colspan: attr(cell, "colspan").and_then(|v| v.trim().parse().ok()),
                    rowspan: attr(cell, "rowspan").and_then(|v| v.trim().parse().ok()),
                })
                .collect(),
        }
    }

    /// Inline content of a cell-like element. A single `<p>` is hoisted; any other block
    /// content is kept as one unsupported fragment.
    fn hoisted_inlines(&self, node: &Handle, depth: usize) -> Vec<InlineNode> {
        let kids = children(node);
        let meaningful: Vec<&Handle> = kids.iter().filter(|kid| is_meaningful(kid)).collect();
        match meaningful.as_slice() {
            [] => Vec::new(),
            [only] if is_tag(only, "p") => trim_edges(self.inlines(&children(only), depth + 1)),
            _ if meaningful.iter().all(|kid| is_inline_node(kid)) => {
                trim_edges(self.inlines(&kids, depth))
            }
            _ => {
                let storage: String = self
                    .flow_blocks(&kids, depth)
                    .iter()
                    .map(node_to_storage)
                    .collect();
                vec![unsupported_inline(storage)]
            }
        }
    }

    fn task_list(&self, node: &Handle, depth: usize) -> TaskList {
        TaskList {
            items: children(node)
                .iter()
                .filter(|item| is_tag(item, "li"))
                .map(|item| TaskItem {
                    id: attr(item, "data-task-id").unwrap_or_default(),
                    uuid: attr(item, "data-task-uuid").unwrap_or_default(),
                    status: TaskStatus::parse(&attr(item, "data-task-status").unwrap_or_default()),
                    body: self.hoisted_inlines(item, depth + 1),
                })
                .collect(),
        }
    }

    fn list(&self, node: &Handle, depth: usize) -> List {
        let ordered = is_tag(node, "ol");
        List {
            ordered,
            start: if ordered {
                attr(node, "start").and_then(|v| v.trim().parse().ok())
            } else {
                None
            },
            items: children(node)
                .iter()
                .filter(|item| is_tag(item, "li"))
                .map(|item| ListItem {
                    checked: None,
                    children: self.simple_blocks(&children(item), depth + 1),
                })
                .collect(),
        }
    }

    fn expand(&self, node: &Handle, depth: usize) -> ExpandMacro {
        let summary = child_element(node, "summary");
        let title = non_empty_attr(node, "data-title").or_else(|| {
            summary
                .as_ref()
                .map(|summary| text_content(summary).trim().to_string())
                .filter(|title| !title.is_empty())
        });
        let body: Vec<Handle> = children(node)
            .into_iter()
            .filter(|child| !is_tag(child, "summary"))
            .collect();
        ExpandMacro {
            title,
            children: self.simple_blocks(&body, depth),
        }
    }

    /// Block content of a container. Runs of inline nodes become paragraphs.
    fn flow_blocks(&self, nodes: &[Handle], depth: usize) -> Vec<DocumentNode> {
        let mut out = Vec::new();
        let mut run: Vec<Handle> = Vec::new();
        for node in nodes {
            if is_inline_node(node) {
                run.push(node.clone());
                continue;
            }
            self.flush_run(&mut run, depth, &mut out);
            if let Some(block) = self.block(node, depth) {
                out.push(block);
            }
        }
        self.flush_run(&mut run, depth, &mut out);
        out
    }

    /// Top-level content. Grouped like [`Self::flow_blocks`], except that a run holding
    /// a single macro element stays that macro.
    fn root_blocks(&self, nodes: &[Handle]) -> Vec<DocumentNode> {
        let mut out = Vec::new();
        let mut run: Vec<Handle> = Vec::new();
        for node in nodes {
            if is_inline_node(node) {
                run.push(node.clone());
                continue;
            }
            self.flush_root_run(&mut run, &mut out);
            if let Some(block) = self.block(node, 0) {
                out.push(block);
            }
        }
        self.flush_root_run(&mut run, &mut out);
        out
    }

    fn flush_root_run(&self, run: &mut Vec<Handle>, out: &mut Vec<DocumentNode>) {
        let meaningful: Vec<&Handle> = run.iter().filter(|node| is_meaningful(node)).collect();
        if let [only] = meaningful.as_slice() {
            if has_attr(only, "data-macro") {
                out.extend(self.block(only, 0));
                run.clear();
                return;
            }
        }
        self.flush_run(run, 0, out);
    }

    fn flush_run(&self, run: &mut Vec<Handle>, depth: usize, out: &mut Vec<DocumentNode>) {
        if run.is_empty() {
            return;
        }
        let inlines = trim_edges(self.inlines(run, depth));
        run.clear();
        if !inlines.is_empty() {
            out.push(BlockNode::Paragraph(Paragraph::new(inlines)).into());
        }
    }

    /// Flow content narrowed to [`SimpleBlock`]. Lists, task lists, quotes and macros are
    /// carried as storage markup.
    fn simple_blocks(&self, nodes: &[Handle], depth: usize) -> Vec<SimpleBlock> {
        self.flow_blocks(nodes, depth)
            .into_iter()
            .map(|node| match node {
                DocumentNode::Block(block) => SimpleBlock::try_from(block).unwrap_or_else(|rich| {
                    SimpleBlock::Unsupported(UnsupportedBlock::confluence_html(node_to_storage(
                        &DocumentNode::Block(rich),
                    )))
                }),
                DocumentNode::Macro(node) => SimpleBlock::Unsupported(
                    UnsupportedBlock::confluence_html(node_to_storage(&DocumentNode::Macro(node))),
                ),
            })
            .collect()
    }

    fn inlines(&self, nodes: &[Handle], depth: usize) -> Vec<InlineNode> {
        let mut out = Vec::new();
        for node in nodes {
            self.push_inline(node, depth, &mut out);
        }
        out
    }

    /// Children of a formatting element, narrowed to [`BaseInline`]. Richer nodes are
    /// kept as their storage markup.
    fn base_inlines(&self, node: &Handle, depth: usize) -> Vec<BaseInline> {
        self.inlines(&children(node), depth)
            .into_iter()
            .map(|inline| {
                BaseInline::try_from(inline).unwrap_or_else(|rich| {
                    BaseInline::Unsupported(UnsupportedInline::confluence(inline_to_storage(&rich)))
                })
            })
            .collect()
    }

    fn push_inline(&self, node: &Handle, depth: usize, out: &mut Vec<InlineNode>) {
        match &node.data {
            NodeData::Text { contents } => push_text(out, &contents.borrow()),
            NodeData::Comment { contents } => {
                out.push(unsupported_inline(format!("<!--{contents}-->")))
            }
            NodeData::Element { .. } => self.element_inline(node, depth, out),
            _ => {}
        }
    }

    fn element_inline(&self, node: &Handle, depth: usize, out: &mut Vec<InlineNode>) {
        if self.too_deep(depth) {
            log::debug!("nesting depth {depth} exceeded, keeping inline element verbatim");
            out.push(unsupported_inline(outer_html(node)));
            return;
        }
        let Some(tag) = tag_name(node).map(str::to_string) else {
            return;
        };
        let next = depth + 1;
        let inline = match tag.as_str() {
            "strong" | "b" => InlineNode::Strong {
                children: self.base_inlines(node, next),
            },
            "em" | "i" => InlineNode::Emphasis {
                children: self.base_inlines(node, next),
            },
            "u" => InlineNode::Underline {
                children: self.base_inlines(node, next),
            },
            "s" | "del" | "strike" => InlineNode::Strikethrough {
                children: self.base_inlines(node, next),
            },
            "sub" => InlineNode::Subscript {
                children: self.base_inlines(node, next),
            },
            "sup" => InlineNode::Superscript {
                children: self.base_inlines(node, next),
            },
            "code" => InlineNode::InlineCode {
                value: text_content(node),
            },
            "br" => InlineNode::LineBreak,
            "time" if has_attr(node, "datetime") => InlineNode::DateTime {
                datetime: attr(node, "datetime").unwrap_or_default(),
            },
            "a" => self.anchor(node, next),
            "span" => match self.span(node, next) {
                Some(inline) => inline,
                None => {
                    for child in children(node) {
                        self.push_inline(&child, next, out);
                    }
                    return;
                }
            },
            "nav" if attr(node, "data-macro").as_deref() == Some("toc") => {
                let toc = toc(node);
                marker_inline(Marker::Toc {
                    min_level: toc.min_level,
                    max_level: toc.max_level,
                })
            }
            "img" => {
                let image = self.image(node);
                unsupported_inline(node_to_storage(&DocumentNode::Block(image)))
            }
            _ if has_attr(node, "data-unsupported-macro") => unsupported_inline(inner_html(node)),
            other => {
                log::debug!("no inline form for <{other}>, keeping it verbatim");
                unsupported_inline(outer_html(node))
            }
        };
        out.push(inline);
    }

    fn anchor(&self, node: &Handle, depth: usize) -> InlineNode {
        if let Some(account_id) = non_empty_attr(node, "data-user-mention") {
            return InlineNode::UserMention { account_id };
        }
        if let Some(appearance) = attr(node, "data-card-appearance") {
            return marker_inline(Marker::SmartLink {
                href: attr(node, "href").unwrap_or_default(),
                appearance,
                datasource: attr(node, "data-datasource").unwrap_or_default(),
            });
        }
        if has_attr(node, "data-confluence-link") {
            return marker_inline(Marker::Link(text_content(node)));
        }
        match attr(node, "href") {
            Some(href) => InlineNode::Link {
                href,
                title: non_empty_attr(node, "title"),
                children: self.base_inlines(node, depth),
            },
            None => unsupported_inline(outer_html(node)),
        }
    }

    /// `None` for a bare span, whose children are spliced into the parent.
    fn span(&self, node: &Handle, depth: usize) -> Option<InlineNode> {
        match attr(node, "data-macro").as_deref() {
            Some("status") => {
                return Some(marker_inline(Marker::Status {
                    title: text_content(node).trim().to_string(),
                    color: attr(node, "data-color").unwrap_or_default(),
                }))
            }
            Some("toc") => {
                let toc = toc(node);
                return Some(marker_inline(Marker::Toc {
                    min_level: toc.min_level,
                    max_level: toc.max_level,
                }));
            }
            _ => {}
        }
        if let Some(shortname) = attr(node, "data-emoji") {
            return Some(InlineNode::Emoticon {
                shortname,
                emoji_id: attr(node, "data-emoji-id").unwrap_or_default(),
                fallback: text_content(node),
            });
        }
        if has_attr(node, "data-unsupported-macro") {
            return Some(unsupported_inline(inner_html(node)));
        }
        let style = attr(node, "style").unwrap_or_default();
        if let Some(color) = non_empty_attr(node, "data-color").or_else(|| style_value(&style, "color")) {
            return Some(InlineNode::ColoredText {
                color,
                children: self.base_inlines(node, depth),
            });
        }
        if let Some(background_color) = style_value(&style, "background-color") {
            return Some(InlineNode::Highlight {
                background_color,
                children: self.base_inlines(node, depth),
            });
        }
        if super::html_tree::attributes(node).is_empty() {
            return None;
        }
        Some(unsupported_inline(outer_html(node)))
    }
}

fn rows_of(section: &Handle) -> Vec<Handle> {
    children(section)
        .into_iter()
        .filter(|row| is_tag(row, "tr"))
        .collect()
}

fn code_text(node: &Handle) -> String {
    match child_element(node, "code") {
        Some(code) => text_content(&code),
        None => text_content(node),
    }
}

fn toc(node: &Handle) -> TocMacro {
    TocMacro {
        min_level: attr(node, "data-min").and_then(|v| v.trim().parse().ok()),
        max_level: attr(node, "data-max").and_then(|v| v.trim().parse().ok()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_dialect(html: &str) -> Vec<DocumentNode> {
        parse(html, &ParserOptions::default())
            .expect("parse")
            .into_children()
    }

    #[test]
    fn paragraph_style_is_read() {
        let nodes = parse_dialect(r#"<p style="text-align: center; margin-left: 30px;">Hi</p>"#);
        assert_eq!(
            nodes,
            vec![DocumentNode::Block(BlockNode::Paragraph(Paragraph {
                children: vec![InlineNode::text("Hi")],
                alignment: Some(crate::ast::Alignment::Center),
                indent: Some(30),
            }))]
        );
    }

    #[test]
    fn generic_container_unwraps_to_first_child() {
        let nodes = parse_dialect("<div><h2>Kept</h2><p>dropped</p></div>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type(), "Heading");
    }

    #[test]
    fn nested_formatting_is_kept_as_markup() {
        let nodes = parse_dialect("<p><strong>a <em>b</em></strong></p>");
        let DocumentNode::Block(BlockNode::Paragraph(paragraph)) = &nodes[0] else {
            panic!("expected paragraph, got {nodes:?}");
        };
        assert_eq!(
            paragraph.children,
            vec![InlineNode::Strong {
                children: vec![
                    BaseInline::text("a "),
                    BaseInline::Unsupported(UnsupportedInline::confluence("<em>b</em>")),
                ]
            }]
        );
    }

    #[test]
    fn nesting_beyond_limit_is_verbatim() {
        let options = ParserOptions {
            max_nesting_depth: 0,
            ..ParserOptions::default()
        };
        let doc = parse("<blockquote><p>deep</p></blockquote>", &options).unwrap();
        let DocumentNode::Block(BlockNode::BlockQuote(quote)) = &doc.children()[0] else {
            panic!("expected quote");
        };
        assert_eq!(
            quote.children,
            vec![SimpleBlock::Unsupported(UnsupportedBlock::confluence_html(
                "<p>deep</p>"
            ))]
        );
    }

    #[test]
    fn strict_mode_rejects_broken_markup() {
        let options = ParserOptions {
            strict_html: true,
            ..ParserOptions::default()
        };
        let err = parse("<p>a</b></p>", &options).unwrap_err();
        assert_eq!(err.source, crate::error::ParseErrorSource::Html);
        assert!(parse("<p>a</b></p>", &ParserOptions::default()).is_ok());
    }

    #[test]
    fn inline_status_becomes_marker() {
        let nodes =
            parse_dialect(r#"<p>x <span data-macro="status" data-color="Green">OK</span></p>"#);
        let DocumentNode::Block(BlockNode::Paragraph(paragraph)) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            paragraph.children[1],
            InlineNode::Unsupported(UnsupportedInline::confluence("<!--cf:status:OK;Green-->"))
        );
    }

    #[test]
    fn emoji_mention_and_date() {
        let nodes = parse_dialect(
            r#"<p><span data-emoji=":smile:" data-emoji-id="1f604">😄</span><a data-user-mention="abc"></a><time datetime="2024-05-01"></time></p>"#,
        );
        let DocumentNode::Block(BlockNode::Paragraph(paragraph)) = &nodes[0] else {
            panic!("expected paragraph");
        };
        let types: Vec<&str> = paragraph.children.iter().map(InlineNode::node_type).collect();
        assert_eq!(types, vec!["Emoticon", "UserMention", "DateTime"]);
    }

    #[test]
    fn colored_and_highlighted_spans() {
        let nodes = parse_dialect(
            r#"<p><span style="color: rgb(255,0,0);">red</span><span style="background-color: yellow">hl</span><span>plain</span></p>"#,
        );
        let DocumentNode::Block(BlockNode::Paragraph(paragraph)) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            paragraph.children,
            vec![
                InlineNode::ColoredText {
                    color: "rgb(255,0,0)".to_string(),
                    children: vec![BaseInline::text("red")],
                },
                InlineNode::Highlight {
                    background_color: "yellow".to_string(),
                    children: vec![BaseInline::text("hl")],
                },
                InlineNode::text("plain"),
            ]
        );
    }

    #[test]
    fn root_text_and_formatting_share_one_paragraph() {
        let nodes = parse_dialect("Hello <strong>world</strong> again");
        assert_eq!(
            nodes,
            vec![DocumentNode::Block(BlockNode::Paragraph(Paragraph::new(vec![
                InlineNode::text("Hello "),
                InlineNode::Strong {
                    children: vec![BaseInline::text("world")],
                },
                InlineNode::text(" again"),
            ])))]
        );
    }

    #[test]
    fn root_status_span_stays_a_macro() {
        let nodes = parse_dialect(r#"<span data-macro="status" data-color="Green">OK</span>"#);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type(), "StatusMacro");
    }

    #[test]
    fn bare_text_at_root_becomes_paragraph() {
        let nodes = parse_dialect("  hello  ");
        assert_eq!(
            nodes,
            vec![DocumentNode::Block(BlockNode::Paragraph(Paragraph::new(vec![
                InlineNode::text("hello")
            ])))]
        );
    }
}
