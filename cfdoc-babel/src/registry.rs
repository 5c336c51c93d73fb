//! Lookup of formats by name and by file extension
//!
//! The CLI never names a format type directly. It asks the registry for "storage",
//! "markdown", "json" or "treeviz", or lets [`FormatRegistry::detect_format_from_filename`]
//! pick one from the input path.

use crate::ast::Document;
use crate::error::FormatError;
use crate::format::Format;
use crate::formats::json::JsonFormat;
use crate::formats::markdown::{MarkdownFormat, MarkdownOptions};
use crate::formats::storage::{ParserOptions, StorageFormat};
use crate::formats::treeviz::TreevizFormat;
use std::collections::HashMap;

/// Formats keyed by [`Format::name`].
///
/// ```ignore
/// let registry = FormatRegistry::default();
/// let doc = registry.parse("<p>Hi</p>", "storage")?;
/// let markdown = registry.serialize(&doc, "markdown")?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// A registry with no formats at all.
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Adds `format`, replacing any format registered under the same name.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Format, FormatError> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::FormatNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Name of the format claiming the extension of `filename`.
    ///
    /// `page.xhtml` maps to storage and `notes.md` to markdown. Paths without a claimed
    /// extension give `None`, and the caller has to ask for `--from`.
    pub fn detect_format_from_filename(&self, filename: &str) -> Option<String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?;
        self.formats
            .values()
            .find(|format| format.file_extensions().contains(&extension))
            .map(|format| format.name().to_string())
    }

    /// Reads `source` with the format called `format`.
    pub fn parse(&self, source: &str, format: &str) -> Result<Document, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(FormatError::NotSupported(format!(
                "Format '{format}' does not support parsing"
            )));
        }
        fmt.parse(source)
    }

    pub fn serialize(&self, doc: &Document, format: &str) -> Result<String, FormatError> {
        self.serialize_with_options(doc, format, &HashMap::new())
    }

    /// Writes `doc` with the format called `format`, passing `--extra-*` parameters on.
    pub fn serialize_with_options(
        &self,
        doc: &Document,
        format: &str,
        options: &HashMap<String, String>,
    ) -> Result<String, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(FormatError::NotSupported(format!(
                "Format '{format}' does not support serialization"
            )));
        }
        fmt.serialize_with_options(doc, options)
    }

    /// Storage, markdown, json and treeviz with default options.
    pub fn with_defaults() -> Self {
        Self::with_options(ParserOptions::default(), MarkdownOptions::default())
    }

    /// Storage, markdown, json and treeviz, with the storage parser and the Markdown
    /// projection configured.
    pub fn with_options(parser: ParserOptions, markdown: MarkdownOptions) -> Self {
        let mut registry = Self::new();
        registry.register(StorageFormat::new(parser));
        registry.register(MarkdownFormat::new(markdown));
        registry.register(JsonFormat);
        registry.register(TreevizFormat);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BlockNode, InlineNode, Paragraph};

    const PAGE: &str = "<h1>Title</h1><p>Body <strong>text</strong></p>";

    fn hello() -> Document {
        Document::new(vec![BlockNode::Paragraph(Paragraph::new(vec![
            InlineNode::text("Hello"),
        ]))
        .into()])
    }

    fn tiny_input_limit() -> ParserOptions {
        ParserOptions {
            max_input_bytes: 8,
            ..ParserOptions::default()
        }
    }

    #[test]
    fn empty_registry_finds_nothing() {
        let registry = FormatRegistry::new();
        assert!(registry.list_formats().is_empty());
        match registry.parse(PAGE, "storage").unwrap_err() {
            FormatError::FormatNotFound(name) => assert_eq!(name, "storage"),
            other => panic!("Expected FormatNotFound error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_register_the_four_formats() {
        let registry = FormatRegistry::default();
        assert_eq!(
            registry.list_formats(),
            vec!["json", "markdown", "storage", "treeviz"]
        );
        assert!(registry.get("pdf").is_err());
    }

    #[test]
    fn storage_to_markdown() {
        let registry = FormatRegistry::default();
        let doc = registry.parse(PAGE, "storage").unwrap();
        assert_eq!(
            registry.serialize(&doc, "markdown").unwrap(),
            "# Title\n\nBody **text**\n"
        );
    }

    #[test]
    fn markdown_to_storage() {
        let registry = FormatRegistry::default();
        let doc = registry.parse("# Title\n\nBody **text**\n", "markdown").unwrap();
        assert_eq!(registry.serialize(&doc, "storage").unwrap(), PAGE);
    }

    #[test]
    fn json_and_treeviz_are_write_only() {
        let registry = FormatRegistry::default();
        for name in ["json", "treeviz"] {
            match registry.parse("{}", name).unwrap_err() {
                FormatError::NotSupported(_) => {}
                other => panic!("Expected NotSupported error for {name}, got {other:?}"),
            }
            assert!(registry.serialize(&hello(), name).is_ok());
        }
    }

    #[test]
    fn extra_parameters_only_reach_formats_that_take_them() {
        let registry = FormatRegistry::default();
        let mut params = HashMap::new();
        params.insert("ast-full".to_string(), "true".to_string());

        let tree = registry
            .serialize_with_options(&hello(), "treeviz", &params)
            .unwrap();
        assert!(tree.contains("Hello"));
        assert!(registry
            .serialize_with_options(&hello(), "storage", &params)
            .is_err());
    }

    #[test]
    fn with_options_configures_the_storage_parser() {
        let registry = FormatRegistry::with_options(tiny_input_limit(), MarkdownOptions::default());
        match registry.parse(PAGE, "storage").unwrap_err() {
            FormatError::ParseError(message) => assert!(message.contains("byte limit")),
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn with_options_configures_markdown_output() {
        let markdown = MarkdownOptions {
            bullet_char: '*',
            ..MarkdownOptions::default()
        };
        let registry = FormatRegistry::with_options(ParserOptions::default(), markdown);
        let doc = registry.parse("<ul><li><p>a</p></li></ul>", "storage").unwrap();
        assert_eq!(registry.serialize(&doc, "markdown").unwrap(), "* a\n");
    }

    #[test]
    fn registering_a_name_again_replaces_it() {
        let mut registry = FormatRegistry::default();
        registry.register(StorageFormat::new(tiny_input_limit()));

        assert_eq!(registry.list_formats().len(), 4);
        assert!(registry.parse(PAGE, "storage").is_err());
    }

    #[test]
    fn detect_format_from_filename() {
        let registry = FormatRegistry::with_defaults();

        assert_eq!(
            registry.detect_format_from_filename("page.xhtml"),
            Some("storage".to_string())
        );
        assert_eq!(
            registry.detect_format_from_filename("/path/to/page.storage"),
            Some("storage".to_string())
        );
        assert_eq!(
            registry.detect_format_from_filename("page.html"),
            Some("storage".to_string())
        );
        assert_eq!(
            registry.detect_format_from_filename("notes.md"),
            Some("markdown".to_string())
        );
        assert_eq!(
            registry.detect_format_from_filename("dump.json"),
            Some("json".to_string())
        );
        assert_eq!(registry.detect_format_from_filename("page.txt"), None);
        assert_eq!(registry.detect_format_from_filename("page"), None);
    }
}
