//! Error types for parsing, serialization and format operations

use std::fmt;

/// Number of input characters kept in a [`ParseError`] for diagnostics.
pub const RAW_CONTENT_PREFIX_CHARS: usize = 200;

/// Which stage of the storage pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorSource {
    /// Input validation or rewriting of the raw storage markup
    Preprocess,
    /// Building the HTML tree from the preprocessed markup
    Html,
}

impl fmt::Display for ParseErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorSource::Preprocess => write!(f, "preprocess"),
            ParseErrorSource::Html => write!(f, "html"),
        }
    }
}

/// A storage document that could not be turned into an AST. There is no partial result.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub source: ParseErrorSource,
    pub message: String,
    /// The first characters of the offending input.
    pub raw_content_prefix: String,
}

impl ParseError {
    pub fn new(source: ParseErrorSource, message: impl Into<String>, raw: &str) -> Self {
        Self {
            source,
            message: message.into(),
            raw_content_prefix: raw.chars().take(RAW_CONTENT_PREFIX_CHARS).collect(),
        }
    }

    pub fn preprocess(message: impl Into<String>, raw: &str) -> Self {
        Self::new(ParseErrorSource::Preprocess, message, raw)
    }

    pub fn html(message: impl Into<String>, raw: &str) -> Self {
        Self::new(ParseErrorSource::Html, message, raw)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.source, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Serialization failure. No current node produces one; the contract stays fallible so
/// callers keep handling it.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializeError {
    pub message: String,
}

impl SerializeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serialize error: {}", self.message)
    }
}

impl std::error::Error for SerializeError {}

/// Errors that can occur during format operations
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Format not found in registry
    FormatNotFound(String),
    /// Error during parsing
    ParseError(String),
    /// Error during serialization
    SerializationError(String),
    /// Format does not support the requested direction
    NotSupported(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::FormatNotFound(name) => write!(f, "Format '{name}' not found"),
            FormatError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            FormatError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            FormatError::NotSupported(msg) => write!(f, "Operation not supported: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<ParseError> for FormatError {
    fn from(err: ParseError) -> Self {
        FormatError::ParseError(err.to_string())
    }
}

impl From<SerializeError> for FormatError {
    fn from(err: SerializeError) -> Self {
        FormatError::SerializationError(err.message)
    }
}
