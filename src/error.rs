//! Error types for untrack library.

use std::io;
use thiserror::Error;

/// Result type alias for untrack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading or rewriting tracked changes.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document package could not be read or written.
    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed or unparseable XML.
    #[error("{}", format_parse_error(.position, .reason))]
    Parse {
        /// Byte offset into the XML part, when known
        position: Option<u64>,
        /// Human-readable reason
        reason: String,
    },

    /// A required part is missing from the document package.
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// The input does not have the structure the operation expects.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Unexpected failure while processing.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error during rendering (prompt text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Build a parse error at a byte offset.
    pub fn parse_at(position: u64, reason: impl Into<String>) -> Self {
        Error::Parse {
            position: Some(position),
            reason: reason.into(),
        }
    }

    /// Whether this is a recoverable missing-part condition.
    pub fn is_missing_part(&self) -> bool {
        matches!(self, Error::MissingPart(_))
    }
}

fn format_parse_error(position: &Option<u64>, reason: &str) -> String {
    match position {
        Some(pos) => format!("XML parse error at byte {}: {}", pos, reason),
        None => format!("XML parse error: {}", reason),
    }
}
