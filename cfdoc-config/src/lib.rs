//! Shared configuration loader for the cfdoc toolchain.
//!
//! `defaults/cfdoc.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`CfdocConfig`].

use cfdoc_babel::{MarkdownOptions, ParserOptions};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/cfdoc.default.toml");

/// Name of the optional per-project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "cfdoc.toml";

/// Top-level configuration consumed by cfdoc applications.
#[derive(Debug, Clone, Deserialize)]
pub struct CfdocConfig {
    pub parser: ParserConfig,
    pub markdown: MarkdownConfig,
    pub inspect: InspectConfig,
}

/// Mirrors [`ParserOptions`].
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    pub max_input_bytes: usize,
    pub strict_html: bool,
    pub capture_original_source: bool,
    pub max_nesting_depth: usize,
}

impl From<&ParserConfig> for ParserOptions {
    fn from(config: &ParserConfig) -> Self {
        ParserOptions {
            max_input_bytes: config.max_input_bytes,
            strict_html: config.strict_html,
            capture_original_source: config.capture_original_source,
            max_nesting_depth: config.max_nesting_depth,
        }
    }
}

impl From<ParserConfig> for ParserOptions {
    fn from(config: ParserConfig) -> Self {
        ParserOptions::from(&config)
    }
}

/// Mirrors [`MarkdownOptions`].
#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownConfig {
    pub tight_lists: bool,
    pub bullet_char: char,
    pub toc_placeholder: String,
}

impl From<MarkdownConfig> for MarkdownOptions {
    fn from(config: MarkdownConfig) -> Self {
        MarkdownOptions {
            tight_lists: config.tight_lists,
            bullet_char: config.bullet_char,
            toc_placeholder: config.toc_placeholder,
        }
    }
}

impl From<&MarkdownConfig> for MarkdownOptions {
    fn from(config: &MarkdownConfig) -> Self {
        MarkdownOptions {
            tight_lists: config.tight_lists,
            bullet_char: config.bullet_char,
            toc_placeholder: config.toc_placeholder.clone(),
        }
    }
}

/// Controls `cfdoc inspect` output.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectConfig {
    pub default_view: InspectView,
    pub ast_full: bool,
}

/// The views offered by `cfdoc inspect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum InspectView {
    #[serde(rename = "preprocessed")]
    Preprocessed,
    #[serde(rename = "ast-json")]
    AstJson,
    #[serde(rename = "ast-treeviz")]
    AstTreeviz,
}

impl InspectView {
    pub const ALL: [InspectView; 3] = [
        InspectView::Preprocessed,
        InspectView::AstJson,
        InspectView::AstTreeviz,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InspectView::Preprocessed => "preprocessed",
            InspectView::AstJson => "ast-json",
            InspectView::AstTreeviz => "ast-treeviz",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.as_str() == name)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<CfdocConfig, ConfigError> {
        let config: CfdocConfig = self.builder.build()?.try_deserialize()?;
        if !matches!(config.markdown.bullet_char, '-' | '*' | '+') {
            return Err(ConfigError::Message(format!(
                "markdown.bullet_char must be one of '-', '*', '+', got '{}'",
                config.markdown.bullet_char
            )));
        }
        Ok(config)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<CfdocConfig, ConfigError> {
    Loader::new().build()
}
