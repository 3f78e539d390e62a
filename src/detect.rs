//! Input detection: document package or bare XML part.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Kind of input handed to the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// ZIP document package (`.docx` and friends)
    Package,
    /// A single XML part
    Xml,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputKind::Package => f.write_str("document package"),
            InputKind::Xml => f.write_str("XML part"),
        }
    }
}

/// ZIP local file header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SNIFF_LEN: usize = 512;

/// Detect the input kind from a file path.
///
/// # Example
/// ```no_run
/// use untrack::detect::{detect_input_from_path, InputKind};
///
/// let kind = detect_input_from_path("report.docx").unwrap();
/// assert_eq!(kind, InputKind::Package);
/// ```
pub fn detect_input_from_path<P: AsRef<Path>>(path: P) -> Result<InputKind> {
    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    file.by_ref()
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut header)?;
    detect_input(&header)
}

/// Detect the input kind from leading bytes.
///
/// # Returns
/// * `Ok(InputKind::Package)` for ZIP data
/// * `Ok(InputKind::Xml)` when the first significant byte is `<`
/// * `Err(Error::UnsupportedInput)` otherwise
pub fn detect_input(data: &[u8]) -> Result<InputKind> {
    if data.starts_with(ZIP_MAGIC) {
        return Ok(InputKind::Package);
    }

    let body = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'<') => Ok(InputKind::Xml),
        Some(_) => Err(Error::UnsupportedInput(
            "expected a document package or an XML part".to_string(),
        )),
        None => Err(Error::UnsupportedInput("input is empty".to_string())),
    }
}

/// Check if bytes start like a ZIP document package.
pub fn is_package_bytes(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Check if a file is a ZIP document package.
pub fn is_package<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_input_from_path(path), Ok(InputKind::Package))
}
