//! Import tests for the storage format (storage → AST)

use cfdoc_babel::ast::{
    BlockNode, DocumentNode, ExpandMacro, Image, ImageSource, InlineNode, MacroNode, Paragraph,
    SimpleBlock, StatusColor, StatusMacro, Table, TaskStatus, TocMacro,
};
use cfdoc_babel::error::ParseErrorSource;
use cfdoc_babel::{
    parse_storage_format, parse_storage_format_with, serialize_to_storage_format, ParserOptions,
};

fn parse_one(source: &str) -> DocumentNode {
    let doc = parse_storage_format(source).expect("Should parse storage");
    assert_eq!(doc.len(), 1, "expected a single node, got {:?}", doc.children());
    doc.children()[0].clone()
}

fn parse_table(source: &str) -> Table {
    match parse_one(source) {
        DocumentNode::Block(BlockNode::Table(table)) => table,
        other => panic!("Expected table, got {other:?}"),
    }
}

fn cell_texts(table: &Table) -> Vec<Vec<String>> {
    table
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| cfdoc_babel::ast::inlines_text(&cell.children))
                .collect()
        })
        .collect()
}

fn reserialize(source: &str) -> String {
    let doc = parse_storage_format(source).unwrap().into_clean();
    serialize_to_storage_format(&doc).unwrap()
}

#[test]
fn test_thead_row_is_header_regardless_of_body() {
    let table = parse_table(
        "<table><thead><tr><th>H</th></tr></thead><tbody><tr><th>X</th></tr><tr><td>1</td></tr></tbody></table>",
    );
    let header = table.header.as_ref().expect("header");
    assert_eq!(header.cells[0].children, vec![InlineNode::text("H")]);
    assert_eq!(cell_texts(&table), vec![vec!["X"], vec!["1"]]);
    assert!(table.rows[0].cells[0].is_header);
}

#[test]
fn test_all_th_first_row_is_promoted() {
    let table = parse_table(
        "<table><tbody><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></tbody></table>",
    );
    let header = table.header.as_ref().expect("header");
    assert!(header.cells.iter().all(|cell| cell.is_header));
    assert_eq!(cell_texts(&table), vec![vec!["1", "2"]]);
}

#[test]
fn test_mixed_first_row_is_not_promoted() {
    let table = parse_table(
        "<table><tbody><tr><th>A</th><td>B</td></tr><tr><td>1</td><td>2</td></tr></tbody></table>",
    );
    assert!(table.header.is_none());
    assert_eq!(table.rows.len(), 2);
}

#[test]
fn test_cell_with_several_blocks_keeps_markup() {
    let table = parse_table("<table><tbody><tr><td><p>a</p><p>b</p></td></tr></tbody></table>");
    let children = &table.rows[0].cells[0].children;
    assert_eq!(children.len(), 1);
    assert!(matches!(children[0], InlineNode::Unsupported(_)));
    assert_eq!(
        reserialize("<table><tbody><tr><td><p>a</p><p>b</p></td></tr></tbody></table>"),
        "<table><tbody><tr><td><p>a</p><p>b</p></td></tr></tbody></table>"
    );
}

#[test]
fn test_attachment_image() {
    let source = r#"<ac:image ac:width="300" ac:alt="diagram"><ri:attachment ri:filename="a.png" ri:version-at-save="2" /></ac:image>"#;
    assert_eq!(
        parse_one(source),
        DocumentNode::Block(BlockNode::Image(Image {
            source: ImageSource::Attachment {
                filename: "a.png".to_string(),
                version: Some(2),
            },
            alt: Some("diagram".to_string()),
            title: None,
            align: None,
            width: Some(300),
        }))
    );
    assert_eq!(reserialize(source), source);
}

#[test]
fn test_status_toc_and_expand_macros() {
    let status = r#"<ac:structured-macro ac:name="status"><ac:parameter ac:name="title">Done</ac:parameter><ac:parameter ac:name="colour">Green</ac:parameter></ac:structured-macro>"#;
    assert_eq!(
        parse_one(status),
        DocumentNode::Macro(MacroNode::StatusMacro(StatusMacro {
            text: "Done".to_string(),
            color: StatusColor::Green,
        }))
    );

    let toc = r#"<ac:structured-macro ac:name="toc"><ac:parameter ac:name="minLevel">2</ac:parameter><ac:parameter ac:name="maxLevel">3</ac:parameter></ac:structured-macro>"#;
    assert_eq!(
        parse_one(toc),
        DocumentNode::Macro(MacroNode::TocMacro(TocMacro {
            min_level: Some(2),
            max_level: Some(3),
        }))
    );

    let expand = r#"<ac:structured-macro ac:name="expand"><ac:parameter ac:name="title">More</ac:parameter><ac:rich-text-body><p>Hidden</p></ac:rich-text-body></ac:structured-macro>"#;
    assert_eq!(
        parse_one(expand),
        DocumentNode::Macro(MacroNode::ExpandMacro(ExpandMacro {
            title: Some("More".to_string()),
            children: vec![SimpleBlock::Paragraph(Paragraph::new(vec![InlineNode::text(
                "Hidden"
            )]))],
        }))
    );

    for source in [status, toc, expand] {
        assert_eq!(reserialize(source), source);
    }
}

#[test]
fn test_task_list() {
    let source = "<ac:task-list><ac:task><ac:task-id>1</ac:task-id><ac:task-uuid>u-1</ac:task-uuid><ac:task-status>complete</ac:task-status><ac:task-body>Ship it</ac:task-body></ac:task></ac:task-list>";
    let DocumentNode::Block(BlockNode::TaskList(tasks)) = parse_one(source) else {
        panic!("Expected task list");
    };
    assert_eq!(tasks.items.len(), 1);
    assert_eq!(tasks.items[0].id, "1");
    assert_eq!(tasks.items[0].uuid, "u-1");
    assert_eq!(tasks.items[0].status, TaskStatus::Complete);
    assert_eq!(tasks.items[0].body, vec![InlineNode::text("Ship it")]);
    assert_eq!(reserialize(source), source);
}

#[test]
fn test_panel_with_list_keeps_list_as_markup() {
    let source = r#"<ac:structured-macro ac:name="note"><ac:rich-text-body><ul><li><p>x</p></li></ul></ac:rich-text-body></ac:structured-macro>"#;
    let DocumentNode::Macro(MacroNode::InfoPanel(panel)) = parse_one(source) else {
        panic!("Expected panel");
    };
    assert!(matches!(panel.children[..], [SimpleBlock::Unsupported(_)]));
    assert_eq!(reserialize(source), source);
}

#[test]
fn test_oversized_input_is_rejected() {
    let options = ParserOptions {
        max_input_bytes: 10,
        ..ParserOptions::default()
    };
    let source = "<p>well over ten bytes</p>";
    let err = parse_storage_format_with(source, &options).unwrap_err();
    assert_eq!(err.source, ParseErrorSource::Preprocess);
    assert_eq!(err.raw_content_prefix, source);
}

#[test]
fn test_unterminated_cdata_is_an_error() {
    let err = parse_storage_format("<p><![CDATA[oops</p>").unwrap_err();
    assert_eq!(err.source, ParseErrorSource::Preprocess);
}

#[test]
fn test_source_capture_can_be_disabled() {
    let options = ParserOptions {
        capture_original_source: false,
        ..ParserOptions::default()
    };
    let doc = parse_storage_format_with("<p>x</p>", &options).unwrap();
    assert!(!doc.has_original_source());
}

#[test]
fn test_root_text_around_formatting_is_one_paragraph() {
    let source = "Hello <strong>world</strong> again";
    let DocumentNode::Block(BlockNode::Paragraph(paragraph)) = parse_one(source) else {
        panic!("Expected paragraph");
    };
    assert_eq!(paragraph.children.len(), 3);
    assert_eq!(reserialize(source), "<p>Hello <strong>world</strong> again</p>");
}

#[test]
fn test_deeply_nested_quotes_parse() {
    let depth = 20_000;
    let source = format!(
        "{}x{}",
        "<blockquote>".repeat(depth),
        "</blockquote>".repeat(depth)
    );
    let doc = parse_storage_format(&source).expect("deep nesting should parse");
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.children()[0].node_type(), "BlockQuote");
}
