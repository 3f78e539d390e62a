//! Change sources: a plugin seam for reading tracked changes from documents.
//!
//! Each source turns one document format into normalized [`Change`]s. The
//! registry maps file extensions to sources, so support for another format
//! is added by registering another implementation.
//!
//! # Example
//!
//! ```no_run
//! use untrack::source::SourceRegistry;
//! use std::path::Path;
//!
//! fn main() -> untrack::Result<()> {
//!     let registry = SourceRegistry::with_defaults();
//!     let changes = registry.extract_path(Path::new("draft.docx"))?;
//!     println!("{} change(s)", changes.len());
//!     Ok(())
//! }
//! ```

mod docx;

pub use docx::DocxSource;

use crate::error::{Error, Result};
use crate::model::Change;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Trait for readers of tracked changes.
pub trait ChangeSource: Send + Sync {
    /// Supported file extensions, lowercase without the leading dot.
    fn supported_extensions(&self) -> &[&str];

    /// Name of this source.
    fn name(&self) -> &str;

    /// Read normalized changes from document bytes.
    fn extract(&self, bytes: &[u8]) -> Result<Vec<Change>>;

    /// Read normalized changes from a file.
    fn extract_path(&self, path: &Path) -> Result<Vec<Change>> {
        let bytes = std::fs::read(path)?;
        self.extract(&bytes)
    }

    /// Check if this source supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry of change sources keyed by extension and name.
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn ChangeSource>>,
    by_name: HashMap<String, Arc<dyn ChangeSource>>,
}

impl SourceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the built-in sources (DOCX).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DocxSource::new()));
        registry
    }

    /// Register a source for all of its extensions.
    pub fn register(&mut self, source: Arc<dyn ChangeSource>) {
        for ext in source.supported_extensions() {
            self.sources.insert(ext.to_lowercase(), source.clone());
        }
        self.by_name.insert(source.name().to_lowercase(), source);
    }

    /// Get a source by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn ChangeSource>> {
        self.sources.get(&ext.to_lowercase()).cloned()
    }

    /// Get a source by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn ChangeSource>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.sources.contains_key(&ext.to_lowercase())
    }

    /// Read changes from a file, choosing the source by extension.
    pub fn extract_path(&self, path: &Path) -> Result<Vec<Change>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedInput("file has no extension".into()))?;
        self.source_for(ext)?.extract_path(path)
    }

    /// Read changes from bytes, choosing the source by extension.
    pub fn extract_bytes(&self, bytes: &[u8], ext: &str) -> Result<Vec<Change>> {
        self.source_for(ext)?.extract(bytes)
    }

    fn source_for(&self, ext: &str) -> Result<Arc<dyn ChangeSource>> {
        self.get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedInput(format!("no change source for extension: {}", ext)))
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
