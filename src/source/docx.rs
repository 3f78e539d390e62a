//! WordprocessingML change source.

use crate::detect::{detect_input, InputKind};
use crate::error::Result;
use crate::model::Change;
use crate::package::{extract_package_revisions, PartSelection};
use crate::parser::{extract_revisions, normalize};

use super::ChangeSource;

/// Reads `w:ins` / `w:del` revisions from DOCX packages or bare XML parts.
#[derive(Debug, Clone, Default)]
pub struct DocxSource {
    parts: PartSelection,
}

impl DocxSource {
    /// Create a source reading the main document part.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read revisions from other parts as well.
    pub fn with_parts(mut self, parts: PartSelection) -> Self {
        self.parts = parts;
        self
    }
}

impl ChangeSource for DocxSource {
    fn supported_extensions(&self) -> &[&str] {
        &["docx", "docm", "dotx", "dotm", "xml"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<Change>> {
        let revisions = match detect_input(bytes)? {
            InputKind::Package => extract_package_revisions(bytes, &self.parts)?,
            InputKind::Xml => extract_revisions(bytes)?,
        };
        Ok(normalize(revisions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChangeKind;

    #[test]
    fn test_docx_source_extensions() {
        let source = DocxSource::new();
        assert!(source.supports_extension("docx"));
        assert!(source.supports_extension("DOCM"));
        assert!(!source.supports_extension("pdf"));
        assert_eq!(source.name(), "docx");
    }

    #[test]
    fn test_extract_from_xml_part() {
        let xml = r#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:del w:id="3"><w:r><w:delText>x</w:delText></w:r></w:del></w:p>"#;
        let changes = DocxSource::new().extract(xml.as_bytes()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Deletion);
        assert_eq!(changes[0].id(), Some("3"));
    }
}
