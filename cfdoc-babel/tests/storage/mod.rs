//! Storage format tests
//!
//! Parse and serialize behaviour of the storage XHTML format, end to end through the
//! public API.

mod layout;
mod parse;
mod roundtrip;

use std::path::PathBuf;

/// Reads a file from `tests/fixtures`.
pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"))
}
