//! JSON dump of the AST
//!
//! Write-only: the JSON view exists for inspection and for handing documents to other
//! tools. Nodes carry a `type` tag matching their variant name; a captured original
//! source is included when present.

use crate::ast::Document;
use crate::error::FormatError;
use crate::format::Format;

/// Pretty-printed JSON for a document.
pub fn to_json_string(doc: &Document) -> Result<String, FormatError> {
    serde_json::to_string_pretty(doc)
        .map_err(|e| FormatError::SerializationError(format!("JSON serialization failed: {e}")))
}

/// Format implementation for the JSON AST dump
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "AST as JSON (write-only)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        to_json_string(doc)
    }
}
