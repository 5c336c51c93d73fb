//! Format implementations
//!
//! This module contains all format implementations that convert between
//! the document AST and its text representations.

pub mod icons;
pub mod json;
pub mod markdown;
pub mod storage;
pub mod treeviz;

pub use json::JsonFormat;
pub use markdown::{MarkdownFormat, MarkdownOptions};
pub use storage::{ParserOptions, StorageFormat};
pub use treeviz::TreevizFormat;
