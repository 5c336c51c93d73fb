//! Import tests for Markdown format (Markdown → AST → storage)

use cfdoc_babel::ast::{
    BlockNode, DocumentNode, InlineNode, MacroNode, PanelType, RawContent, SimpleBlock,
};
use cfdoc_babel::{
    parse_markdown, serialize_to_markdown, serialize_to_storage_format, MarkdownOptions,
};

fn md_to_storage(md: &str) -> String {
    let doc = parse_markdown(md).expect("Should parse");
    serialize_to_storage_format(&doc).expect("Should serialize")
}

#[test]
fn test_paragraph_with_marks() {
    assert_eq!(
        md_to_storage("Hello **world**\n"),
        "<p>Hello <strong>world</strong></p>"
    );
}

#[test]
fn test_heading_content_is_reconstructed() {
    let doc = parse_markdown("## Install *now*\n").expect("Should parse");
    let DocumentNode::Block(BlockNode::Heading(heading)) = &doc.children()[0] else {
        panic!("Expected heading, got {:?}", doc.children());
    };
    assert_eq!(heading.level, 2);
    assert_eq!(heading.children[0], InlineNode::text("Install "));
    assert_eq!(md_to_storage("## Install *now*\n"), "<h2>Install <em>now</em></h2>");
}

#[test]
fn test_markdown_round_trip() {
    let md = "# Title\n\nSome *text*.\n\n- one\n- two\n";
    let doc = parse_markdown(md).expect("Should parse");
    assert!(!doc.has_original_source());
    assert_eq!(
        serialize_to_markdown(&doc, &MarkdownOptions::default()).unwrap(),
        md
    );
}

#[test]
fn test_panel_fence_becomes_macro() {
    let doc = parse_markdown(":::info Heads up\n\nBody\n\n:::\n").expect("Should parse");
    let DocumentNode::Macro(MacroNode::InfoPanel(panel)) = &doc.children()[0] else {
        panic!("Expected panel, got {:?}", doc.children());
    };
    assert_eq!(panel.panel_type, PanelType::Info);
    assert_eq!(
        serialize_to_storage_format(&doc).unwrap(),
        r#"<ac:structured-macro ac:name="info"><ac:parameter ac:name="title">Heads up</ac:parameter><ac:rich-text-body><p>Body</p></ac:rich-text-body></ac:structured-macro>"#
    );
}

#[test]
fn test_task_list_to_storage() {
    assert_eq!(
        md_to_storage("- [x] done\n"),
        "<ac:task-list><ac:task><ac:task-id>1</ac:task-id><ac:task-status>complete</ac:task-status><ac:task-body>done</ac:task-body></ac:task></ac:task-list>"
    );
}

#[test]
fn test_table_to_storage() {
    assert_eq!(
        md_to_storage("| A | B |\n|---|---|\n| 1 | 2 |\n"),
        "<table><thead><tr><th><p>A</p></th><th><p>B</p></th></tr></thead><tbody><tr><td><p>1</p></td><td><p>2</p></td></tr></tbody></table>"
    );
}

#[test]
fn test_list_inside_quote_is_kept_as_markdown_source() {
    let doc = parse_markdown("> - one\n> - two\n").expect("Should parse");
    let DocumentNode::Block(BlockNode::BlockQuote(quote)) = &doc.children()[0] else {
        panic!("Expected quote, got {:?}", doc.children());
    };
    let [SimpleBlock::Unsupported(block)] = &quote.children[..] else {
        panic!("Expected one unsupported block, got {:?}", quote.children);
    };
    assert_eq!(block.raw, RawContent::Markdown("- one\n- two".to_string()));
}
