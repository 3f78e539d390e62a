//! # untrack
//!
//! Accept tracked changes in WordprocessingML documents and list them for review.
//!
//! The library rewrites DOCX XML parts so that every insertion and move
//! destination is kept, every deletion and move source is dropped, and all
//! revision bookkeeping disappears. It also reads the tracked changes out as
//! normalized records suitable for prompts or JSON.
//!
//! ## Quick Start
//!
//! ```no_run
//! use untrack::{accept_file, extract_changes_from_file, render};
//!
//! fn main() -> untrack::Result<()> {
//!     // Review what is pending
//!     let changes = extract_changes_from_file("draft.docx")?;
//!     println!("{}", render::to_prompt(&changes));
//!
//!     // Accept everything
//!     accept_file("draft.docx", "final.docx")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Streaming rewrite**: one pass over the XML, untouched markup copied byte for byte
//! - **Namespace repair**: declarations on removed wrappers are carried to surviving content
//! - **Package aware**: headers, footers and notes can be cleaned alongside the body
//! - **Parallel processing**: Uses Rayon across package parts
//! - **Change listing**: normalized insertions and deletions with author and date

pub mod accept;
pub mod detect;
pub mod error;
pub mod model;
pub mod package;
pub mod parser;
pub mod render;
pub mod source;
pub mod wordml;

// Re-export commonly used types
pub use accept::{accept_revisions, AcceptOptions, AcceptResult, RevisionWarning};
pub use detect::{detect_input, detect_input_from_path, InputKind};
pub use error::{Error, Result};
pub use model::{Change, ChangeKind, ChangeSourceKind, RawRevisionRecord, Revisions};
pub use package::{
    accept_package, MissingPartPolicy, PackageOptions, PackageResult, PartReport, PartSelection,
    PartStatus,
};
pub use render::{to_prompt, JsonFormat};
pub use source::{ChangeSource, DocxSource, SourceRegistry};

use std::path::Path;

/// Name used in reports for a bare XML part.
pub const XML_PART_NAME: &str = "<xml>";

/// Extract normalized changes from a DOCX package or a bare XML part.
///
/// Only `word/document.xml` is read from packages; a package without it has
/// no changes.
///
/// # Example
///
/// ```no_run
/// use untrack::extract_changes;
///
/// let data = std::fs::read("draft.docx").unwrap();
/// for change in extract_changes(&data).unwrap() {
///     println!("{}: {:?}", change.kind, change.author());
/// }
/// ```
pub fn extract_changes(data: &[u8]) -> Result<Vec<Change>> {
    DocxSource::new().extract(data)
}

/// Extract normalized changes from a file.
///
/// # Example
///
/// ```no_run
/// use untrack::extract_changes_from_file;
///
/// let changes = extract_changes_from_file("draft.docx").unwrap();
/// println!("{} change(s)", changes.len());
/// ```
pub fn extract_changes_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Change>> {
    let data = std::fs::read(path)?;
    extract_changes(&data)
}

/// Accept every tracked change, returning cleaned bytes.
///
/// Packages have their main document part rewritten; bare XML parts are
/// rewritten directly.
///
/// # Example
///
/// ```
/// let xml = br#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:ins><w:r><w:t>Hi</w:t></w:r></w:ins></w:p>"#;
/// let cleaned = untrack::accept_changes(xml).unwrap();
/// assert!(!String::from_utf8(cleaned).unwrap().contains("w:ins"));
/// ```
pub fn accept_changes(data: &[u8]) -> Result<Vec<u8>> {
    Untrack::new().accept_bytes(data).map(|result| result.bytes)
}

/// Accept every tracked change in `input` and write the result to `output`.
///
/// Nothing is written if any part fails.
pub fn accept_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    Untrack::new().accept_file(input, output).map(|_| ())
}

/// Accept every tracked change in a file without blocking the async runtime.
#[cfg(feature = "async")]
pub async fn accept_file_async<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    let data = tokio::fs::read(input).await?;
    let cleaned = tokio::task::spawn_blocking(move || accept_changes(&data))
        .await
        .map_err(|e| Error::Internal(format!("accept task failed: {}", e)))??;
    tokio::fs::write(output, cleaned).await?;
    Ok(())
}

/// Extract normalized changes from a file without blocking the async runtime.
#[cfg(feature = "async")]
pub async fn extract_changes_async<P: AsRef<Path>>(path: P) -> Result<Vec<Change>> {
    let data = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || extract_changes(&data))
        .await
        .map_err(|e| Error::Internal(format!("extract task failed: {}", e)))?
}

/// Builder for accepting and listing tracked changes.
///
/// # Example
///
/// ```no_run
/// use untrack::Untrack;
///
/// let result = Untrack::new()
///     .discover_parts()
///     .fail_on_missing_parts()
///     .with_warnings(true)
///     .accept_file("draft.docx", "final.docx")?;
///
/// for (part, warning) in result.warnings() {
///     println!("{}: {} x{}", part, warning.element, warning.count);
/// }
/// # Ok::<(), untrack::Error>(())
/// ```
pub struct Untrack {
    options: PackageOptions,
}

impl Untrack {
    /// Create a new Untrack builder.
    pub fn new() -> Self {
        Self {
            options: PackageOptions::default(),
        }
    }

    /// Set which package parts are processed.
    pub fn with_parts(mut self, parts: PartSelection) -> Self {
        self.options = self.options.with_parts(parts);
        self
    }

    /// Process body, headers, footers, footnotes and endnotes.
    pub fn discover_parts(mut self) -> Self {
        self.options = self.options.discover_parts();
        self
    }

    /// Fail instead of skipping selected parts the package lacks.
    pub fn fail_on_missing_parts(mut self) -> Self {
        self.options = self.options.with_missing_parts(MissingPartPolicy::Fail);
        self
    }

    /// Enable or disable revision warnings.
    pub fn with_warnings(mut self, collect: bool) -> Self {
        self.options = self.options.with_warnings(collect);
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Accept every tracked change in a package or XML part.
    pub fn accept_bytes(&self, data: &[u8]) -> Result<UntrackResult> {
        let kind = detect_input(data)?;
        match kind {
            InputKind::Package => {
                let result = accept_package(data, &self.options)?;
                Ok(UntrackResult {
                    kind,
                    bytes: result.bytes,
                    parts: result.parts,
                })
            }
            InputKind::Xml => {
                let options = AcceptOptions::new().with_warnings(self.options.collect_warnings);
                let result = accept_revisions(data, &options)?;
                Ok(UntrackResult {
                    kind,
                    bytes: result.xml,
                    parts: vec![PartReport {
                        name: XML_PART_NAME.to_string(),
                        status: PartStatus::Cleaned,
                        warnings: result.warnings,
                    }],
                })
            }
        }
    }

    /// Accept every tracked change in `input` and write the result to `output`.
    ///
    /// The output file is only written once every part has been cleaned.
    pub fn accept_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<UntrackResult> {
        let data = std::fs::read(input.as_ref())?;
        let result = self.accept_bytes(&data)?;
        std::fs::write(output.as_ref(), &result.bytes)?;
        log::debug!(
            "wrote {} ({} bytes)",
            output.as_ref().display(),
            result.bytes.len()
        );
        Ok(result)
    }

    /// List normalized changes in the selected parts.
    pub fn changes_bytes(&self, data: &[u8]) -> Result<Vec<Change>> {
        DocxSource::new()
            .with_parts(self.options.parts.clone())
            .extract(data)
    }
}

impl Default for Untrack {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of accepting changes through [`Untrack`].
#[derive(Debug, Clone)]
pub struct UntrackResult {
    /// What the input was
    pub kind: InputKind,
    /// Cleaned package or XML part
    pub bytes: Vec<u8>,
    /// One report per selected part
    pub parts: Vec<PartReport>,
}

impl UntrackResult {
    /// Number of parts that were rewritten.
    pub fn cleaned_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| p.status == PartStatus::Cleaned)
            .count()
    }

    /// All warnings across parts, as `(part, warning)` pairs.
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &RevisionWarning)> {
        self.parts
            .iter()
            .flat_map(|p| p.warnings.iter().map(move |w| (p.name.as_str(), w)))
    }
}
