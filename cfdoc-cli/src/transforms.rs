//! CLI inspect views
//!
//! Each view shows one stage of the conversion pipeline:
//!
//! 1. **Preprocessing** - raw storage markup → html5ever-friendly dialect
//!    - `preprocessed`: the rewritten markup, as the parser sees it
//!
//! 2. **Parsing** - source → Document AST
//!    - `ast-json`: the AST as pretty-printed JSON
//!    - `ast-treeviz`: tree visualization with Unicode icons (default)
//!
//! ## Extra Parameters
//!
//! - `ast-full`: When set to "true", `ast-treeviz` also lists inline nodes, table rows
//!   and cells.
//!
//! Example: `cfdoc inspect page.xhtml ast-treeviz --extra-ast-full`

use cfdoc_babel::formats::json::to_json_string;
use cfdoc_babel::formats::storage::{Preprocessor, StoragePreprocessor};
use cfdoc_babel::formats::treeviz::to_treeviz_str_with_params;
use cfdoc_babel::{FormatRegistry, ParserOptions};
use cfdoc_config::InspectView;
use std::collections::HashMap;

/// Names accepted by `cfdoc inspect`.
pub const AVAILABLE_VIEWS: &[&str] = &["preprocessed", "ast-json", "ast-treeviz"];

/// Render `source` (in format `from`) through the given inspect view.
///
/// The `preprocessed` view only applies to storage input and takes its size and depth
/// limits from `options`. The AST views parse through `registry`, so they honor its parser options.
pub fn execute_view(
    registry: &FormatRegistry,
    source: &str,
    from: &str,
    view: InspectView,
    options: &ParserOptions,
    extra_params: &HashMap<String, String>,
) -> Result<String, String> {
    match view {
        InspectView::Preprocessed => {
            if from != "storage" {
                return Err(format!(
                    "The preprocessed view needs storage input, got '{from}'"
                ));
            }
            let mut output = StoragePreprocessor::new(options.max_input_bytes)
                .with_max_nesting_depth(options.max_nesting_depth)
                .preprocess(source)
                .map_err(|e| format!("Preprocessing failed: {e}"))?;
            if !output.ends_with('\n') {
                output.push('\n');
            }
            Ok(output)
        }
        InspectView::AstJson => {
            let doc = registry
                .parse(source, from)
                .map_err(|e| format!("Transform failed: {e}"))?;
            let mut output = to_json_string(&doc).map_err(|e| e.to_string())?;
            output.push('\n');
            Ok(output)
        }
        InspectView::AstTreeviz => {
            let doc = registry
                .parse(source, from)
                .map_err(|e| format!("Transform failed: {e}"))?;
            Ok(to_treeviz_str_with_params(&doc, extra_params))
        }
    }
}
