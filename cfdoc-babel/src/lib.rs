//! Conversion engine for wiki page content
//!
//!     This crate converts between the wiki's storage format (XHTML with `ac:`/`ri:` elements),
//!     a provider-neutral document AST, and Markdown.
//!
//!     TLDR: For format authors:
//!         - Every format goes through the AST (./ast/mod.rs), never format to format.
//!         - Parsers never drop content they do not understand: it becomes an Unsupported node
//!           carrying the raw markup.
//!         - Text-level work is left to the format's library (html5ever, comrak); we only adapt trees.
//!
//! Architecture
//!
//!     storage XHTML ──preprocess──▶ plain HTML ──html5ever──▶ DOM ──parser──▶ AST
//!     AST ──serializer──▶ storage XHTML
//!     AST ◀──comrak──▶ Markdown
//!
//!     This is a pure lib, that is, it powers cfdoc-cli but is shell agnostic: no code here
//!     supposes a shell environment, be it stdout, env vars or the file system.
//!
//!     The file structure :
//!     .
//!     ├── ast                     # Document, block, macro and inline nodes
//!     ├── common                  # Escaping, percent codec, style parsing
//!     ├── error.rs
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     └── formats
//!         ├── storage             # preprocess, html_tree, parser, layout, serializer
//!         ├── markdown            # parser, serializer
//!         ├── json                # write-only AST dump
//!         └── treeviz             # write-only tree view
//!
//! Testing
//!     tests
//!     └── <format>
//!         ├── <testname>.rs
//!         └── mod.rs
//!
//!     Note that rust does not by default discover tests in subdirectories, so we need to include these
//!     in the mod.
//!
//! Round Tripping
//!
//!     Parsing storage markup keeps the original source on the document. Serializing a document
//!     that still carries it returns the source untouched, so parse → serialize is the identity.
//!     Documents built or edited in code are serialized node by node. Markdown is a lossy view:
//!     see ./formats/markdown/mod.rs for what does not survive.
//!
pub mod ast;
pub mod common;
pub mod error;
pub mod format;
pub mod formats;
pub mod registry;

pub use ast::{Document, DocumentNode};
pub use error::{FormatError, ParseError, SerializeError};
pub use format::Format;
pub use formats::markdown::{
    from_markdown, parse_markdown, serialize_to_markdown, to_markdown, MarkdownOptions,
};
pub use formats::storage::{
    parse_storage_format, parse_storage_format_with, serialize_to_storage_format, ParserOptions,
};
pub use registry::FormatRegistry;
