//! Inline nodes.

use super::ContentSource;
use serde::{Deserialize, Serialize};

/// Text-level content of headings, paragraphs, table cells and task bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InlineNode {
    Text {
        value: String,
    },
    Strong {
        children: Vec<BaseInline>,
    },
    Emphasis {
        children: Vec<BaseInline>,
    },
    Underline {
        children: Vec<BaseInline>,
    },
    Strikethrough {
        children: Vec<BaseInline>,
    },
    Subscript {
        children: Vec<BaseInline>,
    },
    Superscript {
        children: Vec<BaseInline>,
    },
    InlineCode {
        value: String,
    },
    Link {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        children: Vec<BaseInline>,
    },
    LineBreak,
    DateTime {
        datetime: String,
    },
    Emoticon {
        shortname: String,
        emoji_id: String,
        fallback: String,
    },
    UserMention {
        account_id: String,
    },
    ColoredText {
        color: String,
        children: Vec<BaseInline>,
    },
    Highlight {
        background_color: String,
        children: Vec<BaseInline>,
    },
    #[serde(rename = "UnsupportedInline")]
    Unsupported(UnsupportedInline),
}

/// The inline subset permitted inside formatting marks and links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BaseInline {
    Text {
        value: String,
    },
    InlineCode {
        value: String,
    },
    LineBreak,
    #[serde(rename = "UnsupportedInline")]
    Unsupported(UnsupportedInline),
}

/// Inline markup that has no structured counterpart, carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsupportedInline {
    pub raw: String,
    pub source: ContentSource,
}

impl UnsupportedInline {
    pub fn confluence(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            source: ContentSource::Confluence,
        }
    }

    pub fn markdown(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            source: ContentSource::Markdown,
        }
    }
}

impl InlineNode {
    pub fn text(value: impl Into<String>) -> Self {
        InlineNode::Text {
            value: value.into(),
        }
    }

    /// Name of the variant, as used by inspection views.
    pub fn node_type(&self) -> &'static str {
        match self {
            InlineNode::Text { .. } => "Text",
            InlineNode::Strong { .. } => "Strong",
            InlineNode::Emphasis { .. } => "Emphasis",
            InlineNode::Underline { .. } => "Underline",
            InlineNode::Strikethrough { .. } => "Strikethrough",
            InlineNode::Subscript { .. } => "Subscript",
            InlineNode::Superscript { .. } => "Superscript",
            InlineNode::InlineCode { .. } => "InlineCode",
            InlineNode::Link { .. } => "Link",
            InlineNode::LineBreak => "LineBreak",
            InlineNode::DateTime { .. } => "DateTime",
            InlineNode::Emoticon { .. } => "Emoticon",
            InlineNode::UserMention { .. } => "UserMention",
            InlineNode::ColoredText { .. } => "ColoredText",
            InlineNode::Highlight { .. } => "Highlight",
            InlineNode::Unsupported(_) => "UnsupportedInline",
        }
    }

    /// Plain text of this node and its descendants.
    ///
    /// Macros with a textual fallback (date, emoticon, mention) contribute that fallback;
    /// unsupported fragments contribute nothing since their raw form is markup.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    pub(crate) fn push_text(&self, out: &mut String) {
        match self {
            InlineNode::Text { value } | InlineNode::InlineCode { value } => out.push_str(value),
            InlineNode::Strong { children }
            | InlineNode::Emphasis { children }
            | InlineNode::Underline { children }
            | InlineNode::Strikethrough { children }
            | InlineNode::Subscript { children }
            | InlineNode::Superscript { children }
            | InlineNode::Link { children, .. }
            | InlineNode::ColoredText { children, .. }
            | InlineNode::Highlight { children, .. } => {
                for child in children {
                    child.push_text(out);
                }
            }
            InlineNode::LineBreak => out.push('\n'),
            InlineNode::DateTime { datetime } => out.push_str(datetime),
            InlineNode::Emoticon {
                shortname,
                fallback,
                ..
            } => {
                if fallback.is_empty() {
                    out.push_str(shortname);
                } else {
                    out.push_str(fallback);
                }
            }
            InlineNode::UserMention { account_id } => {
                out.push('@');
                out.push_str(account_id);
            }
            InlineNode::Unsupported(_) => {}
        }
    }
}

impl BaseInline {
    pub fn text(value: impl Into<String>) -> Self {
        BaseInline::Text {
            value: value.into(),
        }
    }

    pub(crate) fn push_text(&self, out: &mut String) {
        match self {
            BaseInline::Text { value } | BaseInline::InlineCode { value } => out.push_str(value),
            BaseInline::LineBreak => out.push('\n'),
            BaseInline::Unsupported(_) => {}
        }
    }
}

impl From<BaseInline> for InlineNode {
    fn from(node: BaseInline) -> Self {
        match node {
            BaseInline::Text { value } => InlineNode::Text { value },
            BaseInline::InlineCode { value } => InlineNode::InlineCode { value },
            BaseInline::LineBreak => InlineNode::LineBreak,
            BaseInline::Unsupported(raw) => InlineNode::Unsupported(raw),
        }
    }
}

impl TryFrom<InlineNode> for BaseInline {
    type Error = InlineNode;

    /// Narrows an inline node to the base set, handing the node back when it is richer.
    fn try_from(node: InlineNode) -> Result<Self, Self::Error> {
        match node {
            InlineNode::Text { value } => Ok(BaseInline::Text { value }),
            InlineNode::InlineCode { value } => Ok(BaseInline::InlineCode { value }),
            InlineNode::LineBreak => Ok(BaseInline::LineBreak),
            InlineNode::Unsupported(raw) => Ok(BaseInline::Unsupported(raw)),
            other => Err(other),
        }
    }
}

/// Narrows a run of inline nodes, flattening anything richer than [`BaseInline`] to text.
pub fn flatten_to_base(nodes: Vec<InlineNode>) -> Vec<BaseInline> {
    let mut out: Vec<BaseInline> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let base = match BaseInline::try_from(node) {
            Ok(base) => base,
            Err(rich) => BaseInline::text(rich.text_content()),
        };
        push_base_merged(&mut out, base);
    }
    out
}

/// Concatenated text of a run of inline nodes.
pub fn inlines_text(nodes: &[InlineNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.push_text(&mut out);
    }
    out
}

fn push_base_merged(out: &mut Vec<BaseInline>, node: BaseInline) {
    if let BaseInline::Text { value } = &node {
        if let Some(BaseInline::Text { value: last }) = out.last_mut() {
            last.push_str(value);
            return;
        }
    }
    out.push(node);
}
