//! Block and macro nodes.

use super::inlines::{inlines_text, InlineNode};
use super::ContentSource;
use serde::{Deserialize, Serialize};

/// Structural block content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlockNode {
    Heading(Heading),
    Paragraph(Paragraph),
    CodeBlock(CodeBlock),
    ThematicBreak,
    Image(Image),
    Table(Table),
    List(List),
    TaskList(TaskList),
    BlockQuote(BlockQuote),
    #[serde(rename = "UnsupportedBlock")]
    Unsupported(UnsupportedBlock),
}

/// The shallow block subset allowed inside quotes, list items, panels and expands.
///
/// Lists are deliberately absent: a list nested in one of these containers is carried as
/// [`UnsupportedBlock`] raw markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimpleBlock {
    Heading(Heading),
    Paragraph(Paragraph),
    CodeBlock(CodeBlock),
    ThematicBreak,
    Image(Image),
    Table(Table),
    #[serde(rename = "UnsupportedBlock")]
    Unsupported(UnsupportedBlock),
}

/// Represents a heading with a specific level (1-6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub children: Vec<InlineNode>,
}

/// Represents a paragraph of inline content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub children: Vec<InlineNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    /// Left indentation in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
}

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Represents a block of literal code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Represents an image, either hosted at a URL or stored as a page attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub source: ImageSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// Where image bytes come from. Exactly one of the two is ever present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageSource {
    Url {
        src: String,
    },
    Attachment {
        filename: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<u32>,
    },
}

/// Represents a table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<TableRow>,
    pub rows: Vec<TableRow>,
}

/// Represents a table row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// Represents a table cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableCell {
    pub is_header: bool,
    pub children: Vec<InlineNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colspan: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,
}

/// Represents an ordered or unordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    pub items: Vec<ListItem>,
}

/// Represents an item in a list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    pub children: Vec<SimpleBlock>,
}

/// Represents a wiki task list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskList {
    pub items: Vec<TaskItem>,
}

/// Represents one task of a task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    pub uuid: String,
    pub status: TaskStatus,
    pub body: Vec<InlineNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Incomplete,
    Complete,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Incomplete => "incomplete",
            TaskStatus::Complete => "complete",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("complete") {
            TaskStatus::Complete
        } else {
            TaskStatus::Incomplete
        }
    }
}

/// Represents a block quote.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockQuote {
    pub children: Vec<SimpleBlock>,
}

/// Block markup with no structured counterpart, carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsupportedBlock {
    pub raw: RawContent,
    pub source: ContentSource,
}

/// The verbatim payload of an [`UnsupportedBlock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawContent {
    Html(String),
    Markdown(String),
}

impl UnsupportedBlock {
    /// Raw storage markup captured by the storage parser.
    pub fn confluence_html(raw: impl Into<String>) -> Self {
        Self {
            raw: RawContent::Html(raw.into()),
            source: ContentSource::Confluence,
        }
    }

    /// Raw HTML written directly in a Markdown document.
    pub fn markdown_html(raw: impl Into<String>) -> Self {
        Self {
            raw: RawContent::Html(raw.into()),
            source: ContentSource::Markdown,
        }
    }

    /// Markdown source of a construct the reverse projection does not model.
    pub fn markdown(raw: impl Into<String>) -> Self {
        Self {
            raw: RawContent::Markdown(raw.into()),
            source: ContentSource::Markdown,
        }
    }

    pub fn raw_html(&self) -> Option<&str> {
        match &self.raw {
            RawContent::Html(html) => Some(html),
            RawContent::Markdown(_) => None,
        }
    }

    pub fn raw_markdown(&self) -> Option<&str> {
        match &self.raw {
            RawContent::Markdown(md) => Some(md),
            RawContent::Html(_) => None,
        }
    }
}

/// Wiki macros that have a structured representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MacroNode {
    InfoPanel(InfoPanel),
    ExpandMacro(ExpandMacro),
    TocMacro(TocMacro),
    CodeMacro(CodeMacro),
    StatusMacro(StatusMacro),
}

/// A colored callout panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoPanel {
    pub panel_type: PanelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub children: Vec<SimpleBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelType {
    Info,
    Note,
    Warning,
    Tip,
    Success,
    Error,
}

impl PanelType {
    pub const ALL: [PanelType; 6] = [
        PanelType::Info,
        PanelType::Note,
        PanelType::Warning,
        PanelType::Tip,
        PanelType::Success,
        PanelType::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PanelType::Info => "info",
            PanelType::Note => "note",
            PanelType::Warning => "warning",
            PanelType::Tip => "tip",
            PanelType::Success => "success",
            PanelType::Error => "error",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|panel| panel.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// A collapsible section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpandMacro {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub children: Vec<SimpleBlock>,
}

/// Table of contents placeholder, rendered by the wiki.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TocMacro {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<u8>,
}

/// The code macro with its presentation parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeMacro {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_numbers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line: Option<u32>,
}

/// A colored status lozenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMacro {
    pub text: String,
    pub color: StatusColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusColor {
    #[default]
    Grey,
    Red,
    Yellow,
    Green,
    Blue,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Grey => "Grey",
            StatusColor::Red => "Red",
            StatusColor::Yellow => "Yellow",
            StatusColor::Green => "Green",
            StatusColor::Blue => "Blue",
        }
    }

    /// Lenient lookup; the wiki also writes `Gray` and lowercase names. Unknown colors are grey.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "red" => StatusColor::Red,
            "yellow" => StatusColor::Yellow,
            "green" => StatusColor::Green,
            "blue" => StatusColor::Blue,
            _ => StatusColor::Grey,
        }
    }
}

impl BlockNode {
    pub fn node_type(&self) -> &'static str {
        match self {
            BlockNode::Heading(_) => "Heading",
            BlockNode::Paragraph(_) => "Paragraph",
            BlockNode::CodeBlock(_) => "CodeBlock",
            BlockNode::ThematicBreak => "ThematicBreak",
            BlockNode::Image(_) => "Image",
            BlockNode::Table(_) => "Table",
            BlockNode::List(_) => "List",
            BlockNode::TaskList(_) => "TaskList",
            BlockNode::BlockQuote(_) => "BlockQuote",
            BlockNode::Unsupported(_) => "UnsupportedBlock",
        }
    }
}

impl SimpleBlock {
    pub fn node_type(&self) -> &'static str {
        BlockNode::from(self.clone()).node_type()
    }

    /// Plain text of the block, used when a block has to collapse to text.
    pub fn text_content(&self) -> String {
        match self {
            SimpleBlock::Heading(heading) => inlines_text(&heading.children),
            SimpleBlock::Paragraph(paragraph) => inlines_text(&paragraph.children),
            SimpleBlock::CodeBlock(code) => code.code.clone(),
            SimpleBlock::Table(table) => table
                .header
                .iter()
                .chain(table.rows.iter())
                .flat_map(|row| row.cells.iter())
                .map(|cell| inlines_text(&cell.children))
                .collect::<Vec<_>>()
                .join(" "),
            SimpleBlock::ThematicBreak | SimpleBlock::Image(_) | SimpleBlock::Unsupported(_) => {
                String::new()
            }
        }
    }
}

impl MacroNode {
    pub fn node_type(&self) -> &'static str {
        match self {
            MacroNode::InfoPanel(_) => "InfoPanel",
            MacroNode::ExpandMacro(_) => "ExpandMacro",
            MacroNode::TocMacro(_) => "TocMacro",
            MacroNode::CodeMacro(_) => "CodeMacro",
            MacroNode::StatusMacro(_) => "StatusMacro",
        }
    }
}

impl From<SimpleBlock> for BlockNode {
    fn from(block: SimpleBlock) -> Self {
        match block {
            SimpleBlock::Heading(h) => BlockNode::Heading(h),
            SimpleBlock::Paragraph(p) => BlockNode::Paragraph(p),
            SimpleBlock::CodeBlock(c) => BlockNode::CodeBlock(c),
            SimpleBlock::ThematicBreak => BlockNode::ThematicBreak,
            SimpleBlock::Image(i) => BlockNode::Image(i),
            SimpleBlock::Table(t) => BlockNode::Table(t),
            SimpleBlock::Unsupported(u) => BlockNode::Unsupported(u),
        }
    }
}

impl TryFrom<BlockNode> for SimpleBlock {
    type Error = BlockNode;

    fn try_from(block: BlockNode) -> Result<Self, Self::Error> {
        match block {
            BlockNode::Heading(h) => Ok(SimpleBlock::Heading(h)),
            BlockNode::Paragraph(p) => Ok(SimpleBlock::Paragraph(p)),
            BlockNode::CodeBlock(c) => Ok(SimpleBlock::CodeBlock(c)),
            BlockNode::ThematicBreak => Ok(SimpleBlock::ThematicBreak),
            BlockNode::Image(i) => Ok(SimpleBlock::Image(i)),
            BlockNode::Table(t) => Ok(SimpleBlock::Table(t)),
            BlockNode::Unsupported(u) => Ok(SimpleBlock::Unsupported(u)),
            other => Err(other),
        }
    }
}

impl Paragraph {
    pub fn new(children: Vec<InlineNode>) -> Self {
        Self {
            children,
            alignment: None,
            indent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_not_a_simple_block() {
        let list = BlockNode::List(List {
            ordered: false,
            start: None,
            items: vec![],
        });
        assert!(SimpleBlock::try_from(list).is_err());
    }

    #[test]
    fn panel_type_lookup_is_case_insensitive() {
        assert_eq!(PanelType::from_name("Warning"), Some(PanelType::Warning));
        assert_eq!(PanelType::from_name("jira"), None);
    }

    #[test]
    fn status_color_falls_back_to_grey() {
        assert_eq!(StatusColor::parse("GREEN"), StatusColor::Green);
        assert_eq!(StatusColor::parse("Gray"), StatusColor::Grey);
        assert_eq!(StatusColor::parse("purple"), StatusColor::Grey);
    }

    #[test]
    fn image_source_serializes_with_kind_tag() {
        let image = Image {
            source: ImageSource::Attachment {
                filename: "a.png".to_string(),
                version: Some(2),
            },
            alt: None,
            title: None,
            align: None,
            width: None,
        };
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["source"]["kind"], "attachment");
        assert_eq!(json["source"]["version"], 2);
    }
}
