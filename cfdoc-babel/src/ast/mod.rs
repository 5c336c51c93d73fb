//! Provider-neutral document model.
//!
//! This module defines the AST produced by the storage-format parser and consumed by the
//! storage serializer and the Markdown projector. The node set is closed: every consumer
//! matches exhaustively, so adding a variant is a compile error until each format handles it.
//!
//! Node categories:
//!
//!     - [`BlockNode`]: structural content (headings, paragraphs, tables, lists, ...)
//!     - [`MacroNode`]: wiki macros with a structured form (panels, expand, toc, code, status)
//!     - [`InlineNode`]: text-level content inside blocks
//!     - [`BaseInline`]: the restricted inline set allowed inside formatting marks
//!     - [`SimpleBlock`]: the restricted block set allowed inside quotes, list items and panels
//!
//! [`UnsupportedBlock`] and [`UnsupportedInline`] are the escape hatch: anything a parser
//! cannot classify is carried verbatim through them instead of being dropped.

pub mod blocks;
pub mod document;
pub mod inlines;

pub use blocks::*;
pub use document::{Document, DocumentNode};
pub use inlines::*;

/// Where an unsupported fragment was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Confluence,
    Markdown,
}
