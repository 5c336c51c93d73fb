//! Storage serialization (AST → storage XHTML)
//!
//! A document that still carries its original source is returned verbatim. Otherwise
//! every top-level node is written depth-first into a fragment, and the fragments are
//! assembled with layout reconstruction (see [`super::layout`]).
//!
//! Output is built as a string rather than through rcdom: storage needs CDATA sections,
//! namespaced self-closing resource tags and verbatim passthrough of unsupported markup,
//! none of which an HTML serializer produces.

use super::layout::{assemble, Fragment};
use crate::ast::{
    BaseInline, BlockNode, CodeBlock, CodeMacro, ContentSource, Document, DocumentNode,
    ExpandMacro, Heading, Image, ImageSource, InfoPanel, InlineNode, List, MacroNode, Paragraph,
    RawContent, SimpleBlock, StatusMacro, Table, TableCell, TaskList, TocMacro, UnsupportedBlock,
    UnsupportedInline,
};
use crate::common::codec::{DecisionItem, Marker};
use crate::common::escape::{cdata_section, html_escape};
use crate::common::style::paragraph_style;
use crate::error::SerializeError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLAIN_TEXT_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<ac:plain-text-body>(.*?)</ac:plain-text-body>")
        .expect("PLAIN_TEXT_BODY: invalid regex pattern")
});

/// Serializes a document to storage markup.
pub fn serialize_to_storage_format(doc: &Document) -> Result<String, SerializeError> {
    if let Some(source) = doc.original_source() {
        return Ok(source.to_string());
    }
    let fragments: Vec<Fragment> = doc.children().iter().map(fragment).collect();
    Ok(assemble(&fragments))
}

fn fragment(node: &DocumentNode) -> Fragment {
    if let DocumentNode::Block(BlockNode::Unsupported(block)) = node {
        if let Some(raw) = block.raw_html() {
            if raw.trim_start().starts_with("<!--") {
                if let Some(marker) = Marker::from_comment(raw).filter(Marker::is_layout_boundary) {
                    return Fragment::Marker {
                        marker,
                        raw: raw.to_string(),
                    };
                }
            }
        }
    }
    Fragment::Markup(node_to_storage(node))
}

/// Storage markup of a single node, without layout reconstruction.
pub(crate) fn node_to_storage(node: &DocumentNode) -> String {
    let mut out = String::new();
    match node {
        DocumentNode::Block(block) => write_block(block, &mut out),
        DocumentNode::Macro(node) => write_macro(node, &mut out),
    }
    out
}

/// Storage markup of a single inline node.
pub(crate) fn inline_to_storage(node: &InlineNode) -> String {
    let mut out = String::new();
    write_inline(node, &mut out);
    out
}

fn write_block(block: &BlockNode, out: &mut String) {
    match block {
        BlockNode::Heading(heading) => write_heading(heading, out),
        BlockNode::Paragraph(paragraph) => write_paragraph(paragraph, out),
        BlockNode::CodeBlock(code) => write_code_block(code, out),
        BlockNode::ThematicBreak => out.push_str("<hr />"),
        BlockNode::Image(image) => write_image(image, out),
        BlockNode::Table(table) => write_table(table, out),
        BlockNode::List(list) => write_list(list, out),
        BlockNode::TaskList(tasks) => write_task_list(tasks, out),
        BlockNode::BlockQuote(quote) => {
            out.push_str("<blockquote>");
            write_simple_blocks(&quote.children, out);
            out.push_str("</blockquote>");
        }
        BlockNode::Unsupported(block) => write_unsupported_block(block, out),
    }
}

fn write_simple_blocks(blocks: &[SimpleBlock], out: &mut String) {
    for block in blocks {
        match block {
            SimpleBlock::Heading(heading) => write_heading(heading, out),
            SimpleBlock::Paragraph(paragraph) => write_paragraph(paragraph, out),
            SimpleBlock::CodeBlock(code) => write_code_block(code, out),
            SimpleBlock::ThematicBreak => out.push_str("<hr />"),
            SimpleBlock::Image(image) => write_image(image, out),
            SimpleBlock::Table(table) => write_table(table, out),
            SimpleBlock::Unsupported(block) => write_unsupported_block(block, out),
        }
    }
}

fn write_heading(heading: &Heading, out: &mut String) {
    let level = heading.level.clamp(1, 6);
    out.push_str(&format!("<h{level}>"));
    write_inlines(&heading.children, out);
    out.push_str(&format!("</h{level}>"));
}

/// Plain code blocks have no storage element of their own; they become code macros.
fn write_code_block(code: &CodeBlock, out: &mut String) {
    write_code_macro(
        &CodeMacro {
            language: code.language.clone(),
            code: code.code.clone(),
            ..CodeMacro::default()
        },
        out,
    );
}

fn write_paragraph(paragraph: &Paragraph, out: &mut String) {
    match paragraph_style(paragraph.alignment, paragraph.indent) {
        Some(style) => out.push_str(&format!(r#"<p style="{}">"#, html_escape(&style))),
        None => out.push_str("<p>"),
    }
    write_inlines(&paragraph.children, out);
    out.push_str("</p>");
}

fn write_image(image: &Image, out: &mut String) {
    out.push_str("<ac:image");
    for (name, value) in [
        ("ac:align", image.align.clone()),
        ("ac:width", image.width.map(|w| w.to_string())),
        ("ac:alt", image.alt.clone()),
        ("ac:title", image.title.clone()),
    ] {
        if let Some(value) = value {
            out.push_str(&format!(r#" {name}="{}""#, html_escape(&value)));
        }
    }
    out.push('>');
    match &image.source {
        ImageSource::Attachment { filename, version } => {
            out.push_str(&format!(
                r#"<ri:attachment ri:filename="{}""#,
                html_escape(filename)
            ));
            if let Some(version) = version {
                out.push_str(&format!(r#" ri:version-at-save="{version}""#));
            }
            out.push_str(" />");
        }
        ImageSource::Url { src } => {
            out.push_str(&format!(r#"<ri:url ri:value="{}" />"#, html_escape(src)));
        }
    }
    out.push_str("</ac:image>");
}

fn write_table(table: &Table, out: &mut String) {
    out.push_str("<table>");
    if let Some(header) = &table.header {
        out.push_str("<thead><tr>");
        for cell in &header.cells {
            write_cell(cell, out);
        }
        out.push_str("</tr></thead>");
    }
    out.push_str("<tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in &row.cells {
            write_cell(cell, out);
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

fn write_cell(cell: &TableCell, out: &mut String) {
    let tag = if cell.is_header { "th" } else { "td" };
    out.push('<');
    out.push_str(tag);
    if let Some(colspan) = cell.colspan {
        out.push_str(&format!(r#" colspan="{colspan}""#));
    }
    if let Some(rowspan) = cell.rowspan {
        out.push_str(&format!(r#" rowspan="{rowspan}""#));
    }
    out.push('>');
    match cell.children.as_slice() {
        [] => {}
        // block content captured as one fragment goes back unwrapped
        [InlineNode::Unsupported(raw)] => write_unsupported_inline(raw, out),
        children => {
            out.push_str("<p>");
            write_inlines(children, out);
            out.push_str("</p>");
        }
    }
    out.push_str(&format!("</{tag}>"));
}

fn write_list(list: &List, out: &mut String) {
    if list.ordered {
        match list.start {
            Some(start) if start != 1 => out.push_str(&format!(r#"<ol start="{start}">"#)),
            _ => out.push_str("<ol>"),
        }
    } else {
        out.push_str("<ul>");
    }
    for item in &list.items {
        out.push_str("<li>");
        write_simple_blocks(&item.children, out);
        out.push_str("</li>");
    }
    out.push_str(if list.ordered { "</ol>" } else { "</ul>" });
}

fn write_task_list(tasks: &TaskList, out: &mut String) {
    out.push_str("<ac:task-list>");
    for task in &tasks.items {
        out.push_str("<ac:task>");
        out.push_str(&format!("<ac:task-id>{}</ac:task-id>", html_escape(&task.id)));
        if !task.uuid.is_empty() {
            out.push_str(&format!(
                "<ac:task-uuid>{}</ac:task-uuid>",
                html_escape(&task.uuid)
            ));
        }
        out.push_str(&format!(
            "<ac:task-status>{}</ac:task-status>",
            task.status.as_str()
        ));
        out.push_str("<ac:task-body>");
        write_inlines(&task.body, out);
        out.push_str("</ac:task-body></ac:task>");
    }
    out.push_str("</ac:task-list>");
}

fn write_unsupported_block(block: &UnsupportedBlock, out: &mut String) {
    match &block.raw {
        RawContent::Html(html) => {
            if let Some(Marker::Decision(items)) = html
                .trim_start()
                .starts_with("<!--")
                .then(|| Marker::from_comment(html))
                .flatten()
            {
                write_decision_list(&items, out);
                return;
            }
            out.push_str(&restore_raw(html, block.source));
        }
        RawContent::Markdown(markdown) => {
            out.push_str(&crate::formats::markdown::render_html(markdown));
        }
    }
}

fn write_decision_list(items: &[DecisionItem], out: &mut String) {
    out.push_str(r#"<ac:adf-extension><ac:adf-node type="decision-list">"#);
    for item in items {
        out.push_str(r#"<ac:adf-node type="decision-item">"#);
        out.push_str(&format!(
            r#"<ac:adf-attribute key="local-id">{}</ac:adf-attribute>"#,
            html_escape(&item.local_id)
        ));
        out.push_str(&format!(
            r#"<ac:adf-attribute key="state">{}</ac:adf-attribute>"#,
            html_escape(&item.state)
        ));
        out.push_str(&format!(
            "<ac:adf-content>{}</ac:adf-content></ac:adf-node>",
            html_escape(&item.content)
        ));
    }
    out.push_str(r#"</ac:adf-node><ac:adf-fallback><ul class="decision-list">"#);
    for item in items {
        out.push_str(&format!("<li>{}</li>", html_escape(&item.content)));
    }
    out.push_str("</ul></ac:adf-fallback></ac:adf-extension>");
}

/// Captured storage markup went through the HTML parser, which turned CDATA bodies into
/// escaped text. Puts them back.
fn restore_raw(html: &str, source: ContentSource) -> String {
    match source {
        ContentSource::Confluence => PLAIN_TEXT_BODY
            .replace_all(html, |caps: &Captures| {
                let body = &caps[1];
                if body.contains("<![CDATA[") {
                    caps[0].to_string()
                } else {
                    format!(
                        "<ac:plain-text-body>{}</ac:plain-text-body>",
                        cdata_section(&unescape_html(body))
                    )
                }
            })
            .into_owned(),
        ContentSource::Markdown => html.to_string(),
    }
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

fn write_macro(node: &MacroNode, out: &mut String) {
    match node {
        MacroNode::InfoPanel(panel) => write_panel(panel, out),
        MacroNode::ExpandMacro(expand) => write_expand(expand, out),
        MacroNode::TocMacro(toc) => write_toc(toc, out),
        MacroNode::CodeMacro(code) => write_code_macro(code, out),
        MacroNode::StatusMacro(status) => write_status(status, out),
    }
}

fn macro_open(name: &str, out: &mut String) {
    out.push_str(&format!(r#"<ac:structured-macro ac:name="{name}">"#));
}

fn write_parameter(name: &str, value: &str, out: &mut String) {
    out.push_str(&format!(
        r#"<ac:parameter ac:name="{name}">{}</ac:parameter>"#,
        html_escape(value)
    ));
}

fn write_panel(panel: &InfoPanel, out: &mut String) {
    macro_open(panel.panel_type.as_str(), out);
    if let Some(title) = &panel.title {
        write_parameter("title", title, out);
    }
    out.push_str("<ac:rich-text-body>");
    write_simple_blocks(&panel.children, out);
    out.push_str("</ac:rich-text-body></ac:structured-macro>");
}

fn write_expand(expand: &ExpandMacro, out: &mut String) {
    macro_open("expand", out);
    if let Some(title) = &expand.title {
        write_parameter("title", title, out);
    }
    out.push_str("<ac:rich-text-body>");
    write_simple_blocks(&expand.children, out);
    out.push_str("</ac:rich-text-body></ac:structured-macro>");
}

fn write_toc(toc: &TocMacro, out: &mut String) {
    macro_open("toc", out);
    if let Some(min) = toc.min_level {
        write_parameter("minLevel", &min.to_string(), out);
    }
    if let Some(max) = toc.max_level {
        write_parameter("maxLevel", &max.to_string(), out);
    }
    out.push_str("</ac:structured-macro>");
}

fn write_code_macro(code: &CodeMacro, out: &mut String) {
    macro_open("code", out);
    if let Some(language) = &code.language {
        write_parameter("language", language, out);
    }
    if let Some(title) = &code.title {
        write_parameter("title", title, out);
    }
    if let Some(line_numbers) = code.line_numbers {
        write_parameter("linenumbers", &line_numbers.to_string(), out);
    }
    if let Some(collapse) = code.collapse {
        write_parameter("collapse", &collapse.to_string(), out);
    }
    if let Some(first_line) = code.first_line {
        write_parameter("firstline", &first_line.to_string(), out);
    }
    out.push_str("<ac:plain-text-body>");
    out.push_str(&cdata_section(&code.code));
    out.push_str("</ac:plain-text-body></ac:structured-macro>");
}

fn write_status(status: &StatusMacro, out: &mut String) {
    write_status_parts(&status.text, status.color.as_str(), out);
}

fn write_status_parts(title: &str, color: &str, out: &mut String) {
    macro_open("status", out);
    write_parameter("title", title, out);
    if !color.is_empty() {
        write_parameter("colour", color, out);
    }
    out.push_str("</ac:structured-macro>");
}

fn write_inlines(nodes: &[InlineNode], out: &mut String) {
    for node in nodes {
        write_inline(node, out);
    }
}

fn write_base_inlines(nodes: &[BaseInline], out: &mut String) {
    for node in nodes {
        match node {
            BaseInline::Text { value } => out.push_str(&html_escape(value)),
            BaseInline::InlineCode { value } => {
                out.push_str(&format!("<code>{}</code>", html_escape(value)))
            }
            BaseInline::LineBreak => out.push_str("<br />"),
            BaseInline::Unsupported(raw) => write_unsupported_inline(raw, out),
        }
    }
}

fn write_wrapped(tag: &str, children: &[BaseInline], out: &mut String) {
    out.push_str(&format!("<{tag}>"));
    write_base_inlines(children, out);
    out.push_str(&format!("</{tag}>"));
}

fn write_inline(node: &InlineNode, out: &mut String) {
    match node {
        InlineNode::Text { value } => out.push_str(&html_escape(value)),
        InlineNode::Strong { children } => write_wrapped("strong", children, out),
        InlineNode::Emphasis { children } => write_wrapped("em", children, out),
        InlineNode::Underline { children } => write_wrapped("u", children, out),
        InlineNode::Strikethrough { children } => write_wrapped("s", children, out),
        InlineNode::Subscript { children } => write_wrapped("sub", children, out),
        InlineNode::Superscript { children } => write_wrapped("sup", children, out),
        InlineNode::InlineCode { value } => {
            out.push_str(&format!("<code>{}</code>", html_escape(value)))
        }
        InlineNode::Link {
            href,
            title,
            children,
        } => {
            out.push_str(&format!(r#"<a href="{}""#, html_escape(href)));
            if let Some(title) = title {
                out.push_str(&format!(r#" title="{}""#, html_escape(title)));
            }
            out.push('>');
            write_base_inlines(children, out);
            out.push_str("</a>");
        }
        InlineNode::LineBreak => out.push_str("<br />"),
        InlineNode::DateTime { datetime } => {
            out.push_str(&format!(r#"<time datetime="{}" />"#, html_escape(datetime)))
        }
        InlineNode::Emoticon {
            shortname,
            emoji_id,
            fallback,
        } => {
            let name = shortname.trim_matches(':');
            out.push_str(&format!(
                r#"<ac:emoticon ac:name="{}" ac:emoji-shortname="{}""#,
                html_escape(name),
                html_escape(shortname)
            ));
            if !emoji_id.is_empty() {
                out.push_str(&format!(r#" ac:emoji-id="{}""#, html_escape(emoji_id)));
            }
            if !fallback.is_empty() {
                out.push_str(&format!(r#" ac:emoji-fallback="{}""#, html_escape(fallback)));
            }
            out.push_str(" />");
        }
        InlineNode::UserMention { account_id } => out.push_str(&format!(
            r#"<ac:link><ri:user ri:account-id="{}" /></ac:link>"#,
            html_escape(account_id)
        )),
        InlineNode::ColoredText { color, children } => {
            out.push_str(&format!(r#"<span style="color: {};">"#, html_escape(color)));
            write_base_inlines(children, out);
            out.push_str("</span>");
        }
        InlineNode::Highlight {
            background_color,
            children,
        } => {
            out.push_str(&format!(
                r#"<span style="background-color: {};">"#,
                html_escape(background_color)
            ));
            write_base_inlines(children, out);
            out.push_str("</span>");
        }
        InlineNode::Unsupported(raw) => write_unsupported_inline(raw, out),
    }
}

/// Marker comments expand back into their element forms; anything else is verbatim.
fn write_unsupported_inline(raw: &UnsupportedInline, out: &mut String) {
    let marker = raw
        .raw
        .trim_start()
        .starts_with("<!--")
        .then(|| Marker::from_comment(&raw.raw))
        .flatten();
    match marker {
        Some(Marker::SmartLink {
            href,
            appearance,
            datasource,
        }) => {
            out.push_str(&format!(
                r#"<a href="{}" data-card-appearance="{}""#,
                html_escape(&href),
                html_escape(&appearance)
            ));
            if !datasource.is_empty() {
                out.push_str(&format!(r#" data-datasource="{}""#, html_escape(&datasource)));
            }
            out.push_str(&format!(">{}</a>", html_escape(&href)));
        }
        Some(Marker::Status { title, color }) => write_status_parts(&title, &color, out),
        Some(Marker::Toc {
            min_level,
            max_level,
        }) => write_toc(
            &TocMacro {
                min_level,
                max_level,
            },
            out,
        ),
        Some(Marker::Link(text)) => out.push_str(&html_escape(&text)),
        _ => out.push_str(&restore_raw(&raw.raw, raw.source)),
    }
}
