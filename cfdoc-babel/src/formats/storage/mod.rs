//! Storage format implementation
//!
//! The storage format is the wiki's XHTML dialect: ordinary HTML plus namespaced `ac:` and
//! `ri:` elements for macros, attachments, links and layouts.
//!
//! Parsing runs in two stages. The [`preprocess`] stage rewrites the namespaced markup into
//! plain HTML annotated with `data-*` attributes and `cf:` marker comments, which html5ever
//! can parse without namespace support. The [`parser`] then maps that tree onto the AST.
//! Serialization goes straight from the AST back to real storage markup ([`serializer`]),
//! rebuilding layout grids from their markers ([`layout`]).
//!
//! # Element Mapping Table
//!
//! | Storage                                    | Preprocessed                          | AST                    |
//! |--------------------------------------------|---------------------------------------|------------------------|
//! | `h1`..`h6`, `p`, `hr`, `blockquote`         | unchanged                             | Heading, Paragraph, .. |
//! | `ac:structured-macro[code]`                | `pre[data-language]` / `[data-macro]` | CodeBlock / CodeMacro  |
//! | panel macros (info, note, tip, ..)         | `div[data-macro=<type>]`              | InfoPanel              |
//! | `expand`                                   | `details[data-macro=expand]`          | ExpandMacro            |
//! | `toc`                                      | `nav[data-macro=toc]`                 | TocMacro               |
//! | `status`                                   | `span[data-macro=status]`             | StatusMacro / marker   |
//! | `ac:image`                                 | `img[data-attachment]` / `img[src]`   | Image                  |
//! | `ac:task-list`                             | `ul[data-macro=task-list]`            | TaskList               |
//! | `ac:emoticon`                              | `span[data-emoji]`                    | Emoticon               |
//! | `ac:link > ri:user`                        | `a[data-user-mention]`                | UserMention            |
//! | `ac:adf-extension` decision list           | `cf:decision` comment                 | UnsupportedBlock       |
//! | `ac:layout`                                | `cf:layout-*` marker comments         | UnsupportedBlock runs  |
//! | anything else                              | `[data-unsupported-macro]` wrapper    | UnsupportedBlock       |

pub mod html_tree;
pub mod layout;
pub mod parser;
pub mod preprocess;
pub mod serializer;

pub use parser::{
    parse, parse_storage_format, parse_storage_format_with, parse_with_preprocessor,
    ParserOptions,
};
pub use preprocess::{PassthroughPreprocessor, Preprocessor, StoragePreprocessor};
pub use serializer::serialize_to_storage_format;

use crate::ast::Document;
use crate::error::FormatError;
use crate::format::Format;

/// Format implementation for storage XHTML
#[derive(Default)]
pub struct StorageFormat {
    options: ParserOptions,
}

impl StorageFormat {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }
}

impl Format for StorageFormat {
    fn name(&self) -> &str {
        "storage"
    }

    fn description(&self) -> &str {
        "Wiki storage format (XHTML with ac:/ri: elements)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["xhtml", "storage", "html"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        Ok(parse_storage_format_with(source, &self.options)?)
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        Ok(serialize_to_storage_format(doc)?)
    }
}
