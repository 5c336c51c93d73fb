//! Markdown format implementation
//!
//! This module projects documents to and from CommonMark (with GFM tables, strikethrough and
//! task lists). Markdown is a lossy view: it is meant for reading and light editing, not as a
//! storage representation.
//!
//! # Library Choice
//!
//! We use the `comrak` crate for Markdown parsing and serialization. The projection builds a
//! comrak arena tree ([`to_markdown`]) and reads one back ([`from_markdown`]); comrak does all
//! the text-level work on both ends.
//!
//! # Element Mapping Table
//!
//! | AST Element      | Markdown Equivalent          | Export Notes                       | Import Notes                         |
//! |------------------|------------------------------|------------------------------------|--------------------------------------|
//! | Heading          | `#`..`######`                | Level clamped to 1-6               | Direct                               |
//! | Paragraph        | Paragraph                    | Alignment and indent dropped       | Image-only paragraph → Image         |
//! | CodeBlock        | Fenced block                 | Language → info string             | First info word → language           |
//! | CodeMacro        | Fenced block                 | Title and display params dropped   | Comes back as CodeBlock              |
//! | Image            | `![alt](src "title")`        | Attachment → bare filename         | Bare filename → attachment           |
//! | Table            | GFM table                    | First row promoted if no header    | Header row → header                  |
//! | List / ListItem  | `-` / `1.` lists             | Checked items → `[x]`              | Nested lists kept as raw Markdown    |
//! | TaskList         | `- [ ]` / `- [x]`            | Ids and uuids dropped              | Sequential ids                       |
//! | BlockQuote       | `>`                          | Direct                             | Direct                               |
//! | InfoPanel        | `:::type title` ... `:::`    | One fence per panel                | Known panel types only               |
//! | ExpandMacro      | `<details><summary>`         | HTML block                         | Matched to the closing `</details>`  |
//! | TocMacro         | `[TOC]`                      | Placeholder configurable           | Placeholder paragraph                |
//! | StatusMacro      | `[TEXT]`                     | Color dropped                      | Plain text                           |
//! | Unsupported      | Raw HTML block               | Stored markup verbatim             | HTML block, `source: markdown`       |
//! | Inlines:         |                              |                                    |                                      |
//! |   Strong/Em/Del  | `**` / `*` / `~~`            | Direct                             | Direct                               |
//! |   Underline      | `<u>..</u>`                  | Inline HTML                        | Paired inline HTML                   |
//! |   Sub/Superscr.  | `<sub>` / `<sup>`            | Inline HTML                        | Paired inline HTML                   |
//! |   ColoredText    | Plain text                   | Color dropped                      | n/a                                  |
//! |   Highlight      | Plain text                   | Color dropped                      | n/a                                  |
//! |   DateTime       | Plain text                   | The datetime string                | n/a                                  |
//! |   Emoticon       | Plain text                   | Fallback, else shortname           | n/a                                  |
//! |   UserMention    | `@accountId`                 | Plain text                         | n/a                                  |
//!
//! # Lossy Conversions
//!
//! - Paragraph alignment and indentation, table spans, image size and alignment
//! - Code macro titles, line numbers, collapse state
//! - Colors on text, highlights and status lozenges
//! - Consecutive lists may merge on import once comrak's list separators are stripped

pub mod parser;
pub mod serializer;

pub use parser::{from_markdown, from_markdown_with, parse_markdown, parse_markdown_with};
pub use serializer::{serialize_to_markdown, to_markdown};

use crate::ast::Document;
use crate::error::FormatError;
use crate::format::Format;
use comrak::{markdown_to_html, ComrakOptions, ListStyleType};

/// Knobs for the Markdown projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Emit lists without blank lines between items.
    pub tight_lists: bool,
    /// Bullet used for unordered lists: `-`, `*` or `+`.
    pub bullet_char: char,
    /// Paragraph text that stands for a table of contents.
    pub toc_placeholder: String,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tight_lists: true,
            bullet_char: '-',
            toc_placeholder: "[TOC]".to_string(),
        }
    }
}

impl MarkdownOptions {
    /// The bullet as comrak wants it; anything other than `-`, `*` or `+` falls back to `-`.
    pub(crate) fn bullet_byte(&self) -> u8 {
        match self.bullet_char {
            '*' => b'*',
            '+' => b'+',
            _ => b'-',
        }
    }

    pub(crate) fn list_style(&self) -> ListStyleType {
        match self.bullet_byte() {
            b'*' => ListStyleType::Star,
            b'+' => ListStyleType::Plus,
            _ => ListStyleType::Dash,
        }
    }
}

/// Comrak options shared by both directions.
pub(crate) fn comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.superscript = true;
    // Raw HTML carries unsupported content
    options.render.unsafe_ = true;
    options
}

/// Renders Markdown source to HTML. Used when Markdown-captured content has to be written back
/// as storage markup.
pub(crate) fn render_html(markdown: &str) -> String {
    markdown_to_html(markdown, &comrak_options())
        .trim_end()
        .to_string()
}

/// Format implementation for Markdown
#[derive(Default)]
pub struct MarkdownFormat {
    options: MarkdownOptions,
}

impl MarkdownFormat {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }
}

impl Format for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "CommonMark Markdown (lossy projection)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        parse_markdown_with(source, &self.options)
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        Ok(serialize_to_markdown(doc, &self.options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bullet_falls_back_to_dash() {
        let options = MarkdownOptions {
            bullet_char: '#',
            ..MarkdownOptions::default()
        };
        assert_eq!(options.bullet_byte(), b'-');
    }

    #[test]
    fn renders_markdown_to_html() {
        assert_eq!(render_html("*a*"), "<p><em>a</em></p>");
    }
}
