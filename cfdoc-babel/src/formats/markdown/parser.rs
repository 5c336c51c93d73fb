//! Markdown parsing (Markdown → AST import)
//!
//! Pipeline: Markdown string → Comrak AST → AST
//!
//! Constructs the model has no place for are not dropped: they come back as
//! [`UnsupportedBlock`]s holding their Markdown source, or their raw HTML for HTML blocks.

use super::{comrak_options, serialize_to_markdown, MarkdownOptions};
use crate::ast::{
    flatten_to_base, BaseInline, BlockNode, BlockQuote, CodeBlock, Document, DocumentNode,
    ExpandMacro, Heading, Image, ImageSource, InfoPanel, InlineNode, List, ListItem, MacroNode,
    PanelType, Paragraph, SimpleBlock, Table, TableCell, TableRow, TaskItem, TaskList, TaskStatus,
    TocMacro, UnsupportedBlock, UnsupportedInline,
};
use crate::error::{FormatError, SerializeError};
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{format_commonmark, parse_document, Arena};
use once_cell::sync::Lazy;
use regex::Regex;

static PANEL_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^:::([A-Za-z]+)(?:[ \t]+(.*))?$").expect("PANEL_FENCE: invalid regex pattern")
});

static SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<summary>(.*?)</summary>").expect("SUMMARY: invalid regex pattern")
});

/// Parse a Markdown string with default options
pub fn parse_markdown(source: &str) -> Result<Document, FormatError> {
    parse_markdown_with(source, &MarkdownOptions::default())
}

pub fn parse_markdown_with(source: &str, options: &MarkdownOptions) -> Result<Document, FormatError> {
    let arena = Arena::new();
    let root = parse_document(&arena, source, &comrak_options());
    from_markdown_with(root, options)
}

/// Reads a comrak tree back into a document.
///
/// Fails only when a block that does not fit its container cannot be rendered back to
/// Markdown source.
pub fn from_markdown<'a>(root: &'a AstNode<'a>) -> Result<Document, FormatError> {
    from_markdown_with(root, &MarkdownOptions::default())
}

pub fn from_markdown_with<'a>(
    root: &'a AstNode<'a>,
    options: &MarkdownOptions,
) -> Result<Document, FormatError> {
    let nodes: Vec<&'a AstNode<'a>> = root.children().collect();
    Ok(Document::new(Reader { options }.blocks(&nodes)?))
}

struct Reader<'o> {
    options: &'o MarkdownOptions,
}

/// What a top-level node means for fence tracking.
enum Fence {
    PanelOpen(PanelType, Option<String>),
    DetailsOpen(Option<String>),
    Close,
    None,
}

impl Reader<'_> {
    fn blocks<'a>(&self, nodes: &[&'a AstNode<'a>]) -> Result<Vec<DocumentNode>, SerializeError> {
        let mut out = Vec::new();
        let mut index = 0;
        while index < nodes.len() {
            let node = nodes[index];
            match fence(node) {
                Fence::PanelOpen(panel_type, title) => {
                    if let Some(end) = find_close(nodes, index, is_panel_close) {
                        out.push(
                            MacroNode::InfoPanel(InfoPanel {
                                panel_type,
                                title,
                                children: self.simple_blocks(&nodes[index + 1..end])?,
                            })
                            .into(),
                        );
                        index = end + 1;
                        continue;
                    }
                }
                Fence::DetailsOpen(title) => {
                    if let Some(end) = find_close(nodes, index, is_details_close) {
                        out.push(
                            MacroNode::ExpandMacro(ExpandMacro {
                                title,
                                children: self.simple_blocks(&nodes[index + 1..end])?,
                            })
                            .into(),
                        );
                        index = end + 1;
                        continue;
                    }
                }
                Fence::Close | Fence::None => {}
            }
            out.push(self.block(node)?);
            index += 1;
        }
        Ok(out)
    }

    fn block<'a>(&self, node: &'a AstNode<'a>) -> Result<DocumentNode, SerializeError> {
        let value = node.data.borrow().value.clone();
        let block = match value {
            NodeValue::Heading(heading) => BlockNode::Heading(Heading {
                level: heading.level,
                children: self.inlines(node),
            }),
            NodeValue::Paragraph => {
                if paragraph_text(node).trim() == self.options.toc_placeholder {
                    return Ok(MacroNode::TocMacro(TocMacro::default()).into());
                }
                match sole_image(node) {
                    Some(image) => BlockNode::Image(image),
                    None => BlockNode::Paragraph(Paragraph::new(self.inlines(node))),
                }
            }
            NodeValue::CodeBlock(code) => BlockNode::CodeBlock(code_block(&code.info, &code.literal)),
            NodeValue::ThematicBreak => BlockNode::ThematicBreak,
            NodeValue::BlockQuote => {
                let children: Vec<&'a AstNode<'a>> = node.children().collect();
                BlockNode::BlockQuote(BlockQuote {
                    children: self.simple_blocks(&children)?,
                })
            }
            NodeValue::List(list) => {
                if is_task_list(node) {
                    BlockNode::TaskList(self.task_list(node))
                } else {
                    BlockNode::List(self.list(node, list.list_type, list.start)?)
                }
            }
            NodeValue::Table(_) => BlockNode::Table(self.table(node)),
            NodeValue::HtmlBlock(html) => BlockNode::Unsupported(UnsupportedBlock::markdown_html(
                html.literal.trim_end(),
            )),
            _ => BlockNode::Unsupported(UnsupportedBlock::markdown(node_markdown(node))),
        };
        Ok(block.into())
    }

    /// Content of a container that only holds simple blocks. Anything richer is kept as
    /// Markdown source.
    fn simple_blocks<'a>(
        &self,
        nodes: &[&'a AstNode<'a>],
    ) -> Result<Vec<SimpleBlock>, SerializeError> {
        self.blocks(nodes)?
            .into_iter()
            .map(|node| match node {
                DocumentNode::Block(block) => match SimpleBlock::try_from(block) {
                    Ok(simple) => Ok(simple),
                    Err(rich) => self.as_source(rich.into()),
                },
                DocumentNode::Macro(node) => self.as_source(node.into()),
            })
            .collect()
    }

    fn as_source(&self, node: DocumentNode) -> Result<SimpleBlock, SerializeError> {
        let source = serialize_to_markdown(&Document::new(vec![node]), self.options)?;
        Ok(SimpleBlock::Unsupported(UnsupportedBlock::markdown(
            source.trim_end(),
        )))
    }

    fn list<'a>(
        &self,
        node: &'a AstNode<'a>,
        list_type: ListType,
        start: usize,
    ) -> Result<List, SerializeError> {
        let ordered = matches!(list_type, ListType::Ordered);
        let items = node
            .children()
            .map(|item| {
                let checked = match &item.data.borrow().value {
                    NodeValue::TaskItem(symbol) => Some(symbol.is_some()),
                    _ => None,
                };
                let children: Vec<&'a AstNode<'a>> = item.children().collect();
                Ok(ListItem {
                    checked,
                    children: self.item_blocks(&children)?,
                })
            })
            .collect::<Result<_, SerializeError>>()?;
        Ok(List {
            ordered,
            start: (ordered && start != 1).then_some(start as u32),
            items,
        })
    }

    /// List item content, one block per child; nested lists stay Markdown source.
    fn item_blocks<'a>(
        &self,
        nodes: &[&'a AstNode<'a>],
    ) -> Result<Vec<SimpleBlock>, SerializeError> {
        let mut out = Vec::new();
        for &node in nodes {
            if matches!(node.data.borrow().value, NodeValue::List(_)) {
                out.push(SimpleBlock::Unsupported(UnsupportedBlock::markdown(
                    node_markdown(node),
                )));
            } else {
                out.extend(self.simple_blocks(&[node])?);
            }
        }
        Ok(out)
    }

    fn task_list<'a>(&self, node: &'a AstNode<'a>) -> TaskList {
        let items = node
            .children()
            .enumerate()
            .map(|(index, item)| {
                let status = match &item.data.borrow().value {
                    NodeValue::TaskItem(Some(_)) => TaskStatus::Complete,
                    _ => TaskStatus::Incomplete,
                };
                let body = item
                    .children()
                    .find(|child| matches!(child.data.borrow().value, NodeValue::Paragraph))
                    .map(|paragraph| self.inlines(paragraph))
                    .unwrap_or_default();
                TaskItem {
                    id: (index + 1).to_string(),
                    uuid: String::new(),
                    status,
                    body,
                }
            })
            .collect();
        TaskList { items }
    }

    fn table<'a>(&self, node: &'a AstNode<'a>) -> Table {
        let mut table = Table::default();
        for row in node.children() {
            let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
            let cells = row
                .children()
                .map(|cell| TableCell {
                    is_header: header,
                    children: self.inlines(cell),
                    colspan: None,
                    rowspan: None,
                })
                .collect();
            let row = TableRow { cells };
            if header && table.header.is_none() {
                table.header = Some(row);
            } else {
                table.rows.push(row);
            }
        }
        table
    }

    fn inlines<'a>(&self, node: &'a AstNode<'a>) -> Vec<InlineNode> {
        let children: Vec<&'a AstNode<'a>> = node.children().collect();
        inline_run(&children)
    }
}

fn inline_run<'a>(nodes: &[&'a AstNode<'a>]) -> Vec<InlineNode> {
    let mut out = Vec::new();
    let mut index = 0;
    while index < nodes.len() {
        let value = nodes[index].data.borrow().value.clone();
        if let NodeValue::HtmlInline(raw) = &value {
            if let Some(tag) = html_mark_open(raw) {
                if let Some(end) = find_inline_close(nodes, index, tag) {
                    let children = flatten_to_base(inline_run(&nodes[index + 1..end]));
                    out.push(match tag {
                        "u" => InlineNode::Underline { children },
                        "sub" => InlineNode::Subscript { children },
                        _ => InlineNode::Superscript { children },
                    });
                    index = end + 1;
                    continue;
                }
            }
        }
        push_inline(&mut out, nodes[index], value);
        index += 1;
    }
    out
}

fn push_inline<'a>(out: &mut Vec<InlineNode>, node: &'a AstNode<'a>, value: NodeValue) {
    let inline = match value {
        NodeValue::Text(text) => return push_text(out, &text),
        NodeValue::SoftBreak => return push_text(out, " "),
        NodeValue::LineBreak => InlineNode::LineBreak,
        NodeValue::Code(code) => InlineNode::InlineCode {
            value: code.literal,
        },
        NodeValue::Strong => InlineNode::Strong {
            children: base_children(node),
        },
        NodeValue::Emph => InlineNode::Emphasis {
            children: base_children(node),
        },
        NodeValue::Strikethrough => InlineNode::Strikethrough {
            children: base_children(node),
        },
        NodeValue::Superscript => InlineNode::Superscript {
            children: base_children(node),
        },
        NodeValue::Link(link) => InlineNode::Link {
            href: link.url,
            title: (!link.title.is_empty()).then_some(link.title),
            children: base_children(node),
        },
        NodeValue::Image(link) => InlineNode::Unsupported(UnsupportedInline::markdown(format!(
            "![{}]({})",
            paragraph_text(node),
            link.url
        ))),
        NodeValue::HtmlInline(raw) => {
            if is_line_break_tag(&raw) {
                InlineNode::LineBreak
            } else {
                InlineNode::Unsupported(UnsupportedInline::markdown(raw))
            }
        }
        _ => return push_text(out, &paragraph_text(node)),
    };
    out.push(inline);
}

fn push_text(out: &mut Vec<InlineNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(InlineNode::Text { value }) = out.last_mut() {
        value.push_str(text);
    } else {
        out.push(InlineNode::text(text));
    }
}

fn base_children<'a>(node: &'a AstNode<'a>) -> Vec<BaseInline> {
    let children: Vec<&'a AstNode<'a>> = node.children().collect();
    flatten_to_base(inline_run(&children))
}

fn html_mark_open(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "<u>" => Some("u"),
        "<sub>" => Some("sub"),
        "<sup>" => Some("sup"),
        _ => None,
    }
}

fn find_inline_close<'a>(nodes: &[&'a AstNode<'a>], open: usize, tag: &str) -> Option<usize> {
    let close = format!("</{tag}>");
    nodes[open + 1..]
        .iter()
        .position(|node| match &node.data.borrow().value {
            NodeValue::HtmlInline(raw) => raw.trim().eq_ignore_ascii_case(&close),
            _ => false,
        })
        .map(|offset| open + 1 + offset)
}

fn is_line_break_tag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "<br>" | "<br/>" | "<br />"
    )
}

fn fence<'a>(node: &'a AstNode<'a>) -> Fence {
    match &node.data.borrow().value {
        NodeValue::Paragraph => {
            let text = paragraph_text(node);
            let text = text.trim();
            if text == ":::" {
                return Fence::Close;
            }
            PANEL_FENCE
                .captures(text)
                .and_then(|caps| {
                    let panel_type = PanelType::from_name(&caps[1])?;
                    let title = caps
                        .get(2)
                        .map(|m| m.as_str().trim().to_string())
                        .filter(|t| !t.is_empty());
                    Some(Fence::PanelOpen(panel_type, title))
                })
                .unwrap_or(Fence::None)
        }
        NodeValue::HtmlBlock(html) => {
            let literal = html.literal.trim();
            if literal.eq_ignore_ascii_case("</details>") {
                Fence::Close
            } else if literal.starts_with("<details") && !literal.contains("</details>") {
                let title = SUMMARY
                    .captures(literal)
                    .map(|caps| unescape_html(caps[1].trim()))
                    .filter(|t| !t.is_empty());
                Fence::DetailsOpen(title)
            } else {
                Fence::None
            }
        }
        _ => Fence::None,
    }
}

fn is_panel_close<'a>(node: &'a AstNode<'a>) -> bool {
    matches!(node.data.borrow().value, NodeValue::Paragraph) && matches!(fence(node), Fence::Close)
}

fn is_details_close<'a>(node: &'a AstNode<'a>) -> bool {
    matches!(node.data.borrow().value, NodeValue::HtmlBlock(_))
        && matches!(fence(node), Fence::Close)
}

fn find_close<'a>(
    nodes: &[&'a AstNode<'a>],
    open: usize,
    is_close: fn(&'a AstNode<'a>) -> bool,
) -> Option<usize> {
    nodes[open + 1..]
        .iter()
        .position(|&node| is_close(node))
        .map(|offset| open + 1 + offset)
}

fn code_block(info: &str, literal: &str) -> CodeBlock {
    let language = info.split_whitespace().next().map(str::to_string);
    CodeBlock {
        code: literal.strip_suffix('\n').unwrap_or(literal).to_string(),
        language,
    }
}

fn is_task_list<'a>(list: &'a AstNode<'a>) -> bool {
    list.children().next().is_some()
        && list.children().all(|item| {
            matches!(item.data.borrow().value, NodeValue::TaskItem(_))
                && item.children().count() <= 1
        })
}

/// An image that is the only content of its paragraph.
fn sole_image<'a>(paragraph: &'a AstNode<'a>) -> Option<Image> {
    let mut children = paragraph.children();
    let image = children.next()?;
    if children.next().is_some() {
        return None;
    }
    let data = image.data.borrow();
    let NodeValue::Image(link) = &data.value else {
        return None;
    };
    let alt = paragraph_text(image);
    Some(Image {
        source: image_source(&link.url),
        alt: (!alt.is_empty()).then_some(alt),
        title: (!link.title.is_empty()).then(|| link.title.clone()),
        align: None,
        width: None,
    })
}

/// A bare file name refers to a page attachment; anything with a path or scheme is a URL.
fn image_source(url: &str) -> ImageSource {
    if url.is_empty() || url.contains('/') || url.contains(':') {
        ImageSource::Url {
            src: url.to_string(),
        }
    } else {
        ImageSource::Attachment {
            filename: url.to_string(),
            version: None,
        }
    }
}

fn paragraph_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    collect_text_content(node, &mut text);
    text
}

fn collect_text_content<'a>(node: &'a AstNode<'a>, output: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => output.push_str(text),
        NodeValue::Code(code) => output.push_str(&code.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => output.push(' '),
        _ => {
            for child in node.children() {
                collect_text_content(child, output);
            }
        }
    }
}

/// Markdown source of a subtree.
fn node_markdown<'a>(node: &'a AstNode<'a>) -> String {
    let mut output = Vec::new();
    if format_commonmark(node, &comrak_options(), &mut output).is_err() {
        return paragraph_text(node);
    }
    String::from_utf8_lossy(&output).trim_end().to_string()
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RawContent;

    fn blocks(source: &str) -> Vec<DocumentNode> {
        parse_markdown(source).expect("parse").into_children()
    }

    #[test]
    fn heading_and_paragraph() {
        let nodes = blocks("# Title\n\nSome *emphasis* here.\n");
        assert_eq!(
            nodes[0],
            DocumentNode::from(BlockNode::Heading(Heading {
                level: 1,
                children: vec![InlineNode::text("Title")],
            }))
        );
        assert_eq!(
            nodes[1],
            DocumentNode::from(BlockNode::Paragraph(Paragraph::new(vec![
                InlineNode::text("Some "),
                InlineNode::Emphasis {
                    children: vec![BaseInline::text("emphasis")],
                },
                InlineNode::text(" here."),
            ])))
        );
    }

    #[test]
    fn underline_pairs_are_rebuilt() {
        let nodes = blocks("<u>x</u>\n");
        assert_eq!(
            nodes,
            vec![DocumentNode::from(BlockNode::Paragraph(Paragraph::new(
                vec![InlineNode::Underline {
                    children: vec![BaseInline::text("x")],
                }]
            )))]
        );
    }

    #[test]
    fn fenced_panel_becomes_info_panel() {
        let nodes = blocks(":::warning Careful\n\nHot\n\n:::\n");
        let DocumentNode::Macro(MacroNode::InfoPanel(panel)) = &nodes[0] else {
            panic!("expected a panel, got {nodes:?}");
        };
        assert_eq!(panel.panel_type, PanelType::Warning);
        assert_eq!(panel.title.as_deref(), Some("Careful"));
        assert_eq!(panel.children.len(), 1);
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn unknown_fence_is_plain_text() {
        let nodes = blocks(":::custom\n\nbody\n\n:::\n");
        assert_eq!(nodes.len(), 3);
        assert!(matches!(nodes[0], DocumentNode::Block(BlockNode::Paragraph(_))));
    }

    #[test]
    fn details_becomes_expand() {
        let nodes = blocks("<details><summary>More</summary>\n\nHidden\n\n</details>\n");
        let DocumentNode::Macro(MacroNode::ExpandMacro(expand)) = &nodes[0] else {
            panic!("expected an expand, got {nodes:?}");
        };
        assert_eq!(expand.title.as_deref(), Some("More"));
        assert_eq!(expand.children.len(), 1);
    }

    #[test]
    fn toc_placeholder() {
        assert_eq!(
            blocks("[TOC]\n"),
            vec![DocumentNode::from(MacroNode::TocMacro(TocMacro::default()))]
        );
    }

    #[test]
    fn task_list_gets_sequential_ids() {
        let nodes = blocks("- [x] done\n- [ ] todo\n");
        let DocumentNode::Block(BlockNode::TaskList(tasks)) = &nodes[0] else {
            panic!("expected a task list, got {nodes:?}");
        };
        let ids: Vec<&str> = tasks.items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(tasks.items[0].status, TaskStatus::Complete);
        assert_eq!(tasks.items[1].status, TaskStatus::Incomplete);
    }

    #[test]
    fn nested_list_is_kept_as_markdown() {
        let nodes = blocks("- outer\n  - inner\n");
        let DocumentNode::Block(BlockNode::List(list)) = &nodes[0] else {
            panic!("expected a list, got {nodes:?}");
        };
        let item = &list.items[0];
        assert_eq!(item.children.len(), 2);
        let SimpleBlock::Unsupported(nested) = &item.children[1] else {
            panic!("expected raw markdown, got {:?}", item.children[1]);
        };
        assert_eq!(nested.raw, RawContent::Markdown("- inner".to_string()));
    }

    #[test]
    fn image_only_paragraph_becomes_image() {
        let nodes = blocks("![Diagram](diagram.png)\n\n![Logo](https://x.test/logo.png)\n");
        let DocumentNode::Block(BlockNode::Image(attachment)) = &nodes[0] else {
            panic!("expected an image, got {nodes:?}");
        };
        assert_eq!(
            attachment.source,
            ImageSource::Attachment {
                filename: "diagram.png".to_string(),
                version: None
            }
        );
        assert_eq!(attachment.alt.as_deref(), Some("Diagram"));
        let DocumentNode::Block(BlockNode::Image(url)) = &nodes[1] else {
            panic!("expected an image, got {nodes:?}");
        };
        assert!(matches!(url.source, ImageSource::Url { .. }));
    }

    #[test]
    fn html_block_is_unsupported_markdown_source() {
        let nodes = blocks("<div class=\"x\">raw</div>\n");
        assert_eq!(
            nodes,
            vec![DocumentNode::from(BlockNode::Unsupported(
                UnsupportedBlock::markdown_html("<div class=\"x\">raw</div>")
            ))]
        );
    }

    #[test]
    fn table_header_row() {
        let nodes = blocks("| a | b |\n|---|---|\n| c | d |\n");
        let DocumentNode::Block(BlockNode::Table(table)) = &nodes[0] else {
            panic!("expected a table, got {nodes:?}");
        };
        let header = table.header.as_ref().expect("header row");
        assert!(header.cells.iter().all(|cell| cell.is_header));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells[1].children, vec![InlineNode::text("d")]);
    }

    #[test]
    fn code_block_language() {
        assert_eq!(
            blocks("```rust ignore\nfn main() {}\n```\n"),
            vec![DocumentNode::from(BlockNode::CodeBlock(CodeBlock {
                code: "fn main() {}".to_string(),
                language: Some("rust".to_string()),
            }))]
        );
    }
}
