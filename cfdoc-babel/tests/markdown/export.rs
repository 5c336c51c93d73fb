//! Export tests for Markdown format (storage → AST → Markdown)

use cfdoc_babel::ast::{BaseInline, BlockNode, InlineNode, Paragraph};
use cfdoc_babel::{parse_storage_format, serialize_to_markdown, Document, MarkdownOptions};

fn storage_to_md(source: &str) -> String {
    let doc = parse_storage_format(source).expect("Should parse storage");
    serialize_to_markdown(&doc, &MarkdownOptions::default()).expect("Should serialize")
}

fn paragraph_md(inline: InlineNode) -> String {
    let doc = Document::new(vec![BlockNode::Paragraph(Paragraph::new(vec![inline])).into()]);
    serialize_to_markdown(&doc, &MarkdownOptions::default()).unwrap()
}

#[test]
fn test_heading_paragraph_and_code() {
    let md = storage_to_md(concat!(
        "<h2>Setup</h2><p>Run <code>cargo</code> now.</p>",
        r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">sh</ac:parameter>"#,
        "<ac:plain-text-body><![CDATA[cargo build]]></ac:plain-text-body></ac:structured-macro>",
    ));
    insta::assert_snapshot!(md, @r"
    ## Setup

    Run `cargo` now.

    ```sh
    cargo build
    ```
    ");
}

#[test]
fn test_panel_renders_as_fenced_container() {
    let md = storage_to_md(
        r#"<ac:structured-macro ac:name="warning"><ac:parameter ac:name="title">Careful</ac:parameter><ac:rich-text-body><p>Hot</p></ac:rich-text-body></ac:structured-macro>"#,
    );
    assert_eq!(md, ":::warning Careful\n\nHot\n\n:::\n");
}

#[test]
fn test_underline_degrades_to_inline_html() {
    let md = paragraph_md(InlineNode::Underline {
        children: vec![BaseInline::text("x")],
    });
    assert_eq!(md, "<u>x</u>\n");
}

#[test]
fn test_colored_text_degrades_to_plain_text() {
    let md = paragraph_md(InlineNode::ColoredText {
        color: "red".to_string(),
        children: vec![BaseInline::text("x")],
    });
    assert_eq!(md, "x\n");
}

#[test]
fn test_mention_and_emoticon_fallbacks() {
    assert_eq!(
        paragraph_md(InlineNode::UserMention {
            account_id: "557058".to_string()
        }),
        "@557058\n"
    );
    assert_eq!(
        paragraph_md(InlineNode::Emoticon {
            shortname: ":smile:".to_string(),
            emoji_id: "1f604".to_string(),
            fallback: "😄".to_string(),
        }),
        "😄\n"
    );
}

#[test]
fn test_unknown_macro_is_raw_html() {
    let source = r#"<ac:structured-macro ac:name="jira"><ac:parameter ac:name="key">ABC-1</ac:parameter></ac:structured-macro>"#;
    assert_eq!(storage_to_md(source), format!("{source}\n"));
}

#[test]
fn test_bullet_char_option() {
    let doc = parse_storage_format("<ul><li><p>a</p></li><li><p>b</p></li></ul>").unwrap();
    let options = MarkdownOptions {
        bullet_char: '*',
        ..MarkdownOptions::default()
    };
    assert_eq!(serialize_to_markdown(&doc, &options).unwrap(), "* a\n* b\n");
}
