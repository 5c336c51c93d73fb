//! The common interface of the storage, Markdown, JSON and treeviz formats
//!
//! Storage and Markdown read and write; JSON and treeviz only write. The CLI drives all
//! of them by name through [`crate::FormatRegistry`], so a format has to say which
//! directions it supports and which file extensions it claims.

use crate::ast::Document;
use crate::error::FormatError;
use std::collections::HashMap;

/// A named document format.
///
/// Reading is `source → Document` and writing is `Document → source`. Both default to
/// [`FormatError::NotSupported`], so a write-only format like treeviz only implements
/// the writing half.
///
/// # Examples
///
/// ```ignore
/// struct NodeCount;
///
/// impl Format for NodeCount {
///     fn name(&self) -> &str {
///         "count"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
///         Ok(format!("{} top-level nodes\n", doc.len()))
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// Registry key and `--to`/`--from` value, e.g. "storage" or "markdown"
    fn name(&self) -> &str;

    /// One line shown by `cfdoc --list-formats`
    fn description(&self) -> &str {
        ""
    }

    /// Extensions claimed for detection, without the dot (e.g. ["xhtml", "storage"])
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    fn supports_parsing(&self) -> bool {
        false
    }

    fn supports_serialization(&self) -> bool {
        false
    }

    /// Read `source` into a document.
    fn parse(&self, _source: &str) -> Result<Document, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Write a document out.
    fn serialize(&self, _doc: &Document) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }

    /// Write a document out, honoring `--extra-*` parameters.
    ///
    /// Only formats with tunable output (Markdown bullets, treeviz detail) accept
    /// parameters; everyone else rejects a non-empty map.
    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<String, FormatError> {
        if options.is_empty() {
            self.serialize(doc)
        } else {
            Err(FormatError::NotSupported(format!(
                "Format '{}' does not support extra parameters",
                self.name()
            )))
        }
    }
}
