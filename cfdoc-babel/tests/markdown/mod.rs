//! Markdown format tests
//!
//! Tests for the Markdown projection in both directions.

mod export;
mod import;
