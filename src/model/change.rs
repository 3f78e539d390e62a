//! Normalized tracked-change records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a normalized change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Text removed from the document
    Deletion,
    /// Text added to the document
    Insertion,
    /// A deletion and insertion that together replace text
    Paired,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Deletion => "deletion",
            ChangeKind::Insertion => "insertion",
            ChangeKind::Paired => "paired",
        };
        f.write_str(name)
    }
}

/// Document format a change was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSourceKind {
    /// WordprocessingML package
    Docx,
    /// PDF annotations
    Pdf,
}

impl ChangeSourceKind {
    /// Value stored under the `source` metadata key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSourceKind::Docx => "docx",
            ChangeSourceKind::Pdf => "pdf",
        }
    }
}

/// A normalized tracked change.
///
/// Constructors return `None` when every text field is blank after trimming,
/// so a `Change` always carries some text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// What kind of change this is
    pub kind: ChangeKind,

    /// Removed text (deletions and paired changes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_text: Option<String>,

    /// Added text (insertions and paired changes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_text: Option<String>,

    /// Free-form page or paragraph hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Source-specific metadata; always contains `source`
    pub metadata: BTreeMap<String, String>,
}

impl Change {
    /// Create a deletion.
    pub fn deletion(text: impl Into<String>, source: ChangeSourceKind) -> Option<Self> {
        let text = non_blank(text.into())?;
        Some(Self::build(ChangeKind::Deletion, Some(text), None, source))
    }

    /// Create an insertion.
    pub fn insertion(text: impl Into<String>, source: ChangeSourceKind) -> Option<Self> {
        let text = non_blank(text.into())?;
        Some(Self::build(ChangeKind::Insertion, None, Some(text), source))
    }

    /// Create a replacement from deleted and inserted text.
    ///
    /// If one side is blank the result degrades to a plain deletion or insertion.
    pub fn paired(
        deleted: impl Into<String>,
        inserted: impl Into<String>,
        source: ChangeSourceKind,
    ) -> Option<Self> {
        match (non_blank(deleted.into()), non_blank(inserted.into())) {
            (Some(d), Some(i)) => Some(Self::build(ChangeKind::Paired, Some(d), Some(i), source)),
            (Some(d), None) => Some(Self::build(ChangeKind::Deletion, Some(d), None, source)),
            (None, Some(i)) => Some(Self::build(ChangeKind::Insertion, None, Some(i), source)),
            (None, None) => None,
        }
    }

    fn build(
        kind: ChangeKind,
        deleted_text: Option<String>,
        inserted_text: Option<String>,
        source: ChangeSourceKind,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), source.as_str().to_string());
        Self {
            kind,
            deleted_text,
            inserted_text,
            location: None,
            metadata,
        }
    }

    /// Set the location hint.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Add a metadata entry. Empty values are ignored and `source` cannot be replaced.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if key != "source" && !value.is_empty() {
            self.metadata.insert(key, value);
        }
        self
    }

    /// The `source` metadata value.
    pub fn source(&self) -> &str {
        self.metadata.get("source").map(String::as_str).unwrap_or_default()
    }

    /// Revision id, if recorded.
    pub fn id(&self) -> Option<&str> {
        self.metadata.get("id").map(String::as_str)
    }

    /// Revision author, if recorded.
    pub fn author(&self) -> Option<&str> {
        self.metadata.get("author").map(String::as_str)
    }

    /// Revision date, if recorded.
    pub fn date(&self) -> Option<&str> {
        self.metadata.get("date").map(String::as_str)
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_changes_are_rejected() {
        assert!(Change::deletion("   ", ChangeSourceKind::Docx).is_none());
        assert!(Change::insertion("", ChangeSourceKind::Docx).is_none());
        assert!(Change::paired(" ", "\n", ChangeSourceKind::Pdf).is_none());
    }

    #[test]
    fn test_paired_degrades_to_single_side() {
        let change = Change::paired("old", " ", ChangeSourceKind::Pdf).unwrap();
        assert_eq!(change.kind, ChangeKind::Deletion);
        assert_eq!(change.deleted_text.as_deref(), Some("old"));
        assert!(change.inserted_text.is_none());

        let change = Change::paired("old", "new", ChangeSourceKind::Pdf).unwrap();
        assert_eq!(change.kind, ChangeKind::Paired);
        assert_eq!(change.source(), "pdf");
    }

    #[test]
    fn test_metadata() {
        let change = Change::insertion("Hi", ChangeSourceKind::Docx)
            .unwrap()
            .with_metadata("id", "7")
            .with_metadata("author", "")
            .with_metadata("source", "pdf");

        assert_eq!(change.source(), "docx");
        assert_eq!(change.id(), Some("7"));
        assert_eq!(change.author(), None);
    }

    #[test]
    fn test_serialize_skips_missing_fields() {
        let change = Change::deletion("Bye", ChangeSourceKind::Docx)
            .unwrap()
            .with_location("page 2");
        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains("\"kind\":\"deletion\""));
        assert!(json.contains("\"location\":\"page 2\""));
        assert!(!json.contains("inserted_text"));
    }
}
