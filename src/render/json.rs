//! JSON rendering for change lists.

use crate::error::{Error, Result};
use crate::model::Change;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a change list to a JSON array.
pub fn to_json(changes: &[Change], format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(changes),
        JsonFormat::Compact => serde_json::to_string(changes),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
