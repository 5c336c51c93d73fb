//! Shared icon mapping for the tree visualization format

/// Get the Unicode icon for a given AST node type
///
/// Returns a single Unicode character that visually represents the node type.
pub fn get_icon(node_type: &str) -> &'static str {
    match node_type {
        "Document" => "⧉",
        "Heading" => "§",
        "Paragraph" => "¶",
        "CodeBlock" | "CodeMacro" => "𝒱",
        "ThematicBreak" => "⎯",
        "Image" => "▣",
        "Table" => "▦",
        "TableRow" => "═",
        "TableCell" => "▢",
        "List" => "☰",
        "ListItem" => "•",
        "TaskList" => "☑",
        "TaskItem" => "☐",
        "BlockQuote" => "\"",
        "InfoPanel" => "ℹ",
        "ExpandMacro" => "▸",
        "TocMacro" => "≡",
        "StatusMacro" => "◉",
        "UnsupportedBlock" | "UnsupportedInline" => "∅",
        "Text" => "◦",
        "Strong" => "𝐁",
        "Emphasis" => "𝐼",
        "InlineCode" => "ƒ",
        "Link" => "⊕",
        "UserMention" => "@",
        "LineBreak" => "↵",
        _ => "○",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_mappings() {
        assert_eq!(get_icon("Document"), "⧉");
        assert_eq!(get_icon("Heading"), "§");
        assert_eq!(get_icon("Paragraph"), "¶");
        assert_eq!(get_icon("CodeMacro"), get_icon("CodeBlock"));
        assert_eq!(get_icon("UnsupportedInline"), "∅");
    }

    #[test]
    fn test_unknown_node_type() {
        assert_eq!(get_icon("Underline"), "○");
    }
}
