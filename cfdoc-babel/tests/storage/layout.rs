//! Layout reconstruction tests
//!
//! Layout grids are flattened into `cf:` marker comments while parsing and rebuilt when
//! serializing.

use cfdoc_babel::ast::{BlockNode, DocumentNode, RawContent};
use cfdoc_babel::{parse_storage_format, serialize_to_storage_format};

fn reserialize(source: &str) -> String {
    let doc = parse_storage_format(source).unwrap().into_clean();
    serialize_to_storage_format(&doc).unwrap()
}

#[test]
fn test_markers_rebuild_two_cells() {
    let source = "<!--cf:layout-start--><!--cf:section:0;two_equal;;;2--><!--cf:cell:0;0-->A<!--cf:cell:0;1-->B<!--cf:section-end:0--><!--cf:layout-end-->";
    assert_eq!(
        reserialize(source),
        r#"<ac:layout><ac:layout-section ac:type="two_equal"><ac:layout-cell><p>A</p></ac:layout-cell><ac:layout-cell><p>B</p></ac:layout-cell></ac:layout-section></ac:layout>"#
    );
}

#[test]
fn test_layout_is_flattened_into_marker_blocks() {
    let source = r#"<ac:layout><ac:layout-section ac:type="two_equal"><ac:layout-cell><p>Left</p></ac:layout-cell><ac:layout-cell><p>Right</p></ac:layout-cell></ac:layout-section></ac:layout>"#;
    let doc = parse_storage_format(source).unwrap();
    let kinds: Vec<String> = doc
        .children()
        .iter()
        .map(|node| match node {
            DocumentNode::Block(BlockNode::Unsupported(block)) => match &block.raw {
                RawContent::Html(raw) => raw.clone(),
                RawContent::Markdown(raw) => raw.clone(),
            },
            other => other.node_type().to_string(),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "<!--cf:layout-start-->",
            "<!--cf:section:0;two_equal;;;2-->",
            "<!--cf:cell:0;0-->",
            "Paragraph",
            "<!--cf:cell:0;1-->",
            "Paragraph",
            "<!--cf:section-end:0-->",
            "<!--cf:layout-end-->",
        ]
    );
    assert_eq!(reserialize(source), source);
}

#[test]
fn test_breakout_attributes_and_several_sections() {
    let source = concat!(
        r#"<ac:layout>"#,
        r#"<ac:layout-section ac:type="fixed-width" ac:breakout-mode="wide" ac:breakout-width="1200"><ac:layout-cell><h2>Top</h2></ac:layout-cell></ac:layout-section>"#,
        r#"<ac:layout-section ac:type="three_equal"><ac:layout-cell><p>1</p></ac:layout-cell><ac:layout-cell></ac:layout-cell><ac:layout-cell><p>3</p></ac:layout-cell></ac:layout-section>"#,
        r#"</ac:layout>"#,
    );
    assert_eq!(reserialize(source), source);
}

#[test]
fn test_content_around_layout_is_kept() {
    let source = r#"<p>before</p><ac:layout><ac:layout-section ac:type="single"><ac:layout-cell><p>inside</p></ac:layout-cell></ac:layout-section></ac:layout><p>after</p>"#;
    assert_eq!(reserialize(source), source);
}

#[test]
fn test_oversized_cell_count_only_emits_present_cells() {
    let source = "<!--cf:layout-start--><!--cf:section:0;two_equal;;;2000000--><!--cf:cell:0;0-->A<!--cf:section-end:0--><!--cf:layout-end-->";
    assert_eq!(
        reserialize(source),
        r#"<ac:layout><ac:layout-section ac:type="two_equal"><ac:layout-cell><p>A</p></ac:layout-cell></ac:layout-section></ac:layout>"#
    );
}
